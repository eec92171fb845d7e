use std::path::PathBuf;
use std::collections::HashMap;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Templates {
    pub dev_mode: Option<bool>,
    pub directory: Option<PathBuf>
}

#[derive(Debug, Deserialize)]
pub struct Disk {
    pub api_base: Option<String>,
    pub timeout: Option<u64>,
    pub connect_timeout: Option<u64>,
    pub user_agent: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct Cache {
    pub ttl: Option<u64>,
    pub max_capacity: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct Download {
    pub concurrency: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct Listener {
    pub addr: String,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub listeners: Option<HashMap<String, Listener>>,

    pub templates: Option<Templates>,

    pub disk: Option<Disk>,
    pub cache: Option<Cache>,
    pub download: Option<Download>,

    pub request_timeout: Option<u64>,
}
