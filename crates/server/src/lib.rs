pub mod config;

pub mod db;

pub mod rest;

pub mod openapi;

pub mod error_convert;

pub mod telemetry;

pub mod logging;

pub mod health;

pub mod auth;

pub mod storage;

// Case intake domain
pub mod locks;

pub mod lifecycle;

pub mod analysis;

pub mod notify;

pub mod stats;

pub mod service;
