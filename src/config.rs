use std::collections::HashMap;
use std::fs::Metadata;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;
use std::net::{SocketAddr, IpAddr};
use std::fmt::{Display, Formatter};
use std::time::Duration;

use clap::Parser;
use url::Url;

use crate::error::{self, Context};

mod shape;

pub const DEFAULT_LISTENER: &str = "main";

#[derive(Debug, Parser)]
#[command(author, version ,about, long_about = None)]
pub struct CliArgs {
    /// a config file to load settings from, may be given multiple times
    #[arg(long)]
    config: Vec<PathBuf>
}

#[derive(Debug)]
pub struct Config {
    pub settings: Settings,
}

pub fn get_config() -> error::Result<Config> {
    Config::from_args(CliArgs::parse())
}

impl Config {
    pub fn from_args(args: CliArgs) -> error::Result<Self> {
        let cwd = std::env::current_dir()
            .context("failed to retrieve cwd for Settings")?;
        let mut settings = Settings::try_default()?;

        for config_path in args.config {
            let full = if config_path.is_absolute() {
                config_path
            } else {
                normalize(cwd.join(config_path))
            };

            tracing::debug!("loading config file \"{}\"", full.display());

            let loaded = Self::load_file(&full)?;
            let src = SrcFile::new(&full)?;
            let dot = DotPath::new(&"settings");

            settings.merge(&src, dot, loaded)?;
        }

        if settings.listeners.is_empty() {
            settings.listeners.insert(DEFAULT_LISTENER.into(), Listener::default());
        }

        tracing::debug!("{settings:#?}");

        Ok(Config {
            settings,
        })
    }

    fn load_file(path: &PathBuf) -> error::Result<shape::Settings> {
        let ext = path.extension().context(format!(
            "failed to retrieve the file extension for config file: \"{}\"", path.display()
        ))?;

        let ext = ext.to_ascii_lowercase();
        let file = std::fs::OpenOptions::new()
            .read(true)
            .open(path)
            .context(format!("failed to open config file: \"{}\"", path.display()))?;
        let reader = std::io::BufReader::new(file);

        if ext.eq("yaml") || ext.eq("yml") {
            serde_yaml::from_reader(reader).context(format!(
                "failed to parse yaml config file: \"{}\"", path.display()
            ))
        } else if ext.eq("json") {
            serde_json::from_reader(reader).context(format!(
                "failed to parse json config file: \"{}\"", path.display()
            ))
        } else {
            Err(error::Error::new().message(format!(
                "unknown type of config file: \"{}\"", path.display()
            )))
        }
    }
}

struct SrcFile<'a> {
    parent: &'a Path,
    src: &'a Path,
}

impl<'a> SrcFile<'a> {
    fn new(src: &'a Path) -> error::Result<Self> {
        let parent = src.parent().context(format!(
            "failed to retrieve parent path from source file \"{}\"", src.display()
        ))?;

        Ok(SrcFile {
            parent,
            src
        })
    }
}

impl<'a> Display for SrcFile<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "\"{}\"", self.src.display())
    }
}

struct Quote<'a>(&'a dyn Display);

impl<'a> Display for Quote<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "\"{}\"", self.0)
    }
}

struct DotPath<'a>(Vec<&'a dyn Display>);

impl<'a> DotPath<'a> {
    fn new(name: &'a (dyn Display)) -> Self {
        DotPath(vec![name])
    }

    fn push(&self, name: &'a (dyn Display)) -> Self {
        let mut path = self.0.clone();
        path.push(name);

        DotPath(path)
    }
}

impl<'a> Display for DotPath<'a> {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> std::fmt::Result {
        let mut first = true;

        for name in &self.0 {
            if first {
                write!(fmt, "{name}")?;
                first = false;
            } else {
                write!(fmt, ".{name}")?;
            }
        }

        Ok(())
    }
}

#[derive(Debug)]
pub struct Settings {
    pub listeners: HashMap<String, Listener>,
    pub templates: Templates,
    pub disk: Disk,
    pub cache: Cache,
    pub download: Download,
    pub request_timeout: Duration,
}

impl Settings {
    fn try_default() -> error::Result<Self> {
        Ok(Settings {
            listeners: HashMap::new(),
            templates: Templates::default(),
            disk: Disk::try_default()?,
            cache: Cache::default(),
            download: Download::default(),
            request_timeout: Duration::from_secs(90),
        })
    }

    fn merge(&mut self, src: &SrcFile<'_>, dot: DotPath<'_>, settings: shape::Settings) -> error::Result<()> {
        if let Some(listeners) = settings.listeners {
            let listeners_dot = dot.push(&"listeners");

            for (key, listener) in listeners {
                if let Some(found) = self.listeners.get_mut(&key) {
                    found.merge(src, listeners_dot.push(&Quote(&key)), listener)?;
                } else {
                    let mut default = Listener::default();
                    default.merge(src, listeners_dot.push(&Quote(&key)), listener)?;

                    self.listeners.insert(key, default);
                }
            }
        }

        if let Some(templates) = settings.templates {
            self.templates.merge(src, dot.push(&"templates"), templates)?;
        }

        if let Some(disk) = settings.disk {
            self.disk.merge(src, dot.push(&"disk"), disk)?;
        }

        if let Some(cache) = settings.cache {
            self.cache.merge(src, dot.push(&"cache"), cache)?;
        }

        if let Some(download) = settings.download {
            self.download.merge(src, dot.push(&"download"), download)?;
        }

        if let Some(request_timeout) = settings.request_timeout {
            self.request_timeout = check_secs(request_timeout, src, dot.push(&"request_timeout"))?;
        }

        Ok(())
    }
}

#[derive(Debug)]
pub struct Listener {
    pub addr: SocketAddr,
}

impl Listener {
    fn merge(&mut self, src: &SrcFile<'_>, dot_path: DotPath<'_>, listener: shape::Listener) -> error::Result<()> {
        self.addr = match SocketAddr::from_str(&listener.addr) {
            Ok(valid) => valid,
            Err(_) => match IpAddr::from_str(&listener.addr) {
                Ok(valid) => SocketAddr::from((valid, 8080)),
                Err(_) => {
                    return Err(error::Error::new().message(format!(
                        "{dot_path}.addr invalid: \"{}\" file: {src}", listener.addr
                    )));
                }
            }
        };

        Ok(())
    }
}

impl Default for Listener {
    fn default() -> Self {
        Listener {
            addr: SocketAddr::from((
                IpAddr::from([0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0]),
                8080
            )),
        }
    }
}

#[derive(Debug, Default)]
pub struct Templates {
    pub dev_mode: bool,
    /// when present, templates found here replace the built-in ones
    pub directory: Option<PathBuf>,
}

impl Templates {
    fn merge(&mut self, src: &SrcFile<'_>, dot_path: DotPath<'_>, templates: shape::Templates) -> error::Result<()> {
        if let Some(dev_mode) = templates.dev_mode {
            self.dev_mode = dev_mode;
        }

        if let Some(directory) = templates.directory {
            self.directory = Some(check_path(directory, src, dot_path.push(&"directory"), false)?);
        }

        Ok(())
    }
}

#[derive(Debug)]
pub struct Disk {
    pub api_base: Url,
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
    pub limit: Option<u32>,
}

impl Disk {
    fn try_default() -> error::Result<Self> {
        let api_base = Url::parse(pubdisk_api::client::DEFAULT_API_BASE)?;

        Ok(Disk {
            api_base,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: format!("pubdisk/{}", env!("CARGO_PKG_VERSION")),
            limit: None,
        })
    }

    fn merge(&mut self, src: &SrcFile<'_>, dot: DotPath<'_>, disk: shape::Disk) -> error::Result<()> {
        if let Some(api_base) = disk.api_base {
            let url = Url::parse(&api_base).context(format!(
                "{} invalid url: \"{api_base}\" file: {src}", dot.push(&"api_base")
            ))?;

            if url.cannot_be_a_base() {
                return Err(error::Error::new().message(format!(
                    "{} cannot be used as a base url: \"{api_base}\" file: {src}", dot.push(&"api_base")
                )));
            }

            self.api_base = url;
        }

        if let Some(timeout) = disk.timeout {
            self.timeout = check_secs(timeout, src, dot.push(&"timeout"))?;
        }

        if let Some(connect_timeout) = disk.connect_timeout {
            self.connect_timeout = check_secs(connect_timeout, src, dot.push(&"connect_timeout"))?;
        }

        if let Some(user_agent) = disk.user_agent {
            self.user_agent = user_agent;
        }

        if let Some(limit) = disk.limit {
            if limit == 0 {
                return Err(error::Error::new().message(format!(
                    "{} must be greater than 0. file: {src}", dot.push(&"limit")
                )));
            }

            self.limit = Some(limit);
        }

        Ok(())
    }
}

#[derive(Debug)]
pub struct Cache {
    pub ttl: Duration,
    pub max_capacity: u64,
}

impl Cache {
    fn merge(&mut self, src: &SrcFile<'_>, dot: DotPath<'_>, cache: shape::Cache) -> error::Result<()> {
        if let Some(ttl) = cache.ttl {
            self.ttl = check_secs(ttl, src, dot.push(&"ttl"))?;
        }

        if let Some(max_capacity) = cache.max_capacity {
            self.max_capacity = max_capacity;
        }

        Ok(())
    }
}

impl Default for Cache {
    fn default() -> Self {
        Cache {
            ttl: Duration::from_secs(300),
            max_capacity: 10_000,
        }
    }
}

#[derive(Debug)]
pub struct Download {
    pub concurrency: usize,
}

impl Download {
    fn merge(&mut self, src: &SrcFile<'_>, dot: DotPath<'_>, download: shape::Download) -> error::Result<()> {
        if let Some(concurrency) = download.concurrency {
            if concurrency == 0 {
                return Err(error::Error::new().message(format!(
                    "{} must be greater than 0. file: {src}", dot.push(&"concurrency")
                )));
            }

            self.concurrency = concurrency;
        }

        Ok(())
    }
}

impl Default for Download {
    fn default() -> Self {
        Download {
            concurrency: 4
        }
    }
}

fn check_secs(given: u64, src: &SrcFile<'_>, dot: DotPath<'_>) -> error::Result<Duration> {
    if given == 0 {
        return Err(error::Error::new().message(format!(
            "{dot} must be greater than 0 seconds. file: {src}"
        )));
    }

    Ok(Duration::from_secs(given))
}

fn check_path(given: PathBuf, src: &SrcFile<'_>, dot: DotPath<'_>, is_file: bool) -> error::Result<PathBuf> {
    let full = if given.is_absolute() {
        given
    } else {
        normalize(src.parent.join(given))
    };

    tracing::debug!("{dot} {src} checking {}", full.display());

    let meta = metadata(&full).context(format!(
        "{dot} failed to retrieve metadata for: {src}"
    ))?.context(format!(
        "{dot} {src} was not found"
    ))?;

    if is_file {
        if !meta.is_file() {
            return Err(error::Error::new().message(format!(
                "{dot} is not a file in: {src}"
            )));
        }
    } else {
        if !meta.is_dir() {
            return Err(error::Error::new().message(format!(
                "{dot} is not a directory in: {src}"
            )));
        }
    }

    Ok(full)
}

fn metadata<P>(path: P) -> Result<Option<Metadata>, std::io::Error>
where
    P: AsRef<Path>
{
    match path.as_ref().metadata() {
        Ok(m) => Ok(Some(m)),
        Err(err) => match err.kind() {
            ErrorKind::NotFound => Ok(None),
            _ => Err(err)
        }
    }
}

/// resolves "." and ".." without touching the file system
fn normalize<P>(path: P) -> PathBuf
where
    P: AsRef<Path>
{
    let mut rtn = PathBuf::new();

    for comp in path.as_ref().components() {
        match comp {
            Component::Prefix(prefix) => {
                rtn.push(prefix.as_os_str());
            }
            Component::ParentDir => {
                rtn.pop();
            }
            Component::Normal(c) => {
                rtn.push(c);
            }
            Component::RootDir => {
                rtn.push(comp.as_os_str());
            }
            Component::CurDir => {}
        }
    }

    rtn
}
