pub mod fixes;
pub mod health;
pub mod logs;
pub mod report;
pub mod results;
pub mod scan;
pub mod screens;
pub mod sessions;
pub mod setup;
