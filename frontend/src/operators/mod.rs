pub mod only_latest;
