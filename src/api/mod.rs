//! HTTP 接口层

pub mod services;
