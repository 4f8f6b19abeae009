pub mod fetch_models;
pub mod run;
