pub mod app;
pub mod catalog;
pub mod config;
pub mod custom_foods;
pub mod db;
pub mod diary;
pub mod error;
pub mod state;
pub mod storage;
