pub mod candidature;
pub mod import_run;
pub mod offer;
pub mod technology;
pub mod user;
