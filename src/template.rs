use std::path::Path;

use handlebars::Handlebars;

use crate::error;
use crate::config;

pub const INDEX_PAGE: &str = "pages/index";
pub const FILES_PAGE: &str = "pages/files";

const BUILT_IN: [(&str, &str); 2] = [
    (INDEX_PAGE, include_str!("../templates/pages/index.hbs")),
    (FILES_PAGE, include_str!("../templates/pages/files.hbs")),
];

fn get_registry_name<'a>(base: &Path, path: &'a Path) -> error::Result<&'a str> {
    let stripped = path.strip_prefix(base)
        .map_err(|e| error::Error::new()
            .kind("InvalidTemplateName")
            .message(format!("template file is outside of the template directory. path: {}", path.display()))
            .source(e))?
        .to_str()
        .ok_or(error::Error::new()
            .kind("InvalidTemplateName")
            .message(format!("template file contains invalid UTF-8 characters. path: {}", path.display())))?;

    Ok(stripped.strip_suffix(".hbs").unwrap_or(stripped))
}

/// registers every `.hbs` file under the directory, replacing any template
/// already registered with the same name
fn load_template_directory(registry: &mut Handlebars<'_>, directory: &Path) -> error::Result<()> {
    use std::fs::read_dir;

    let mut dir_queue = vec![(
        directory.to_path_buf(),
        read_dir(directory)
            .map_err(|e| error::Error::from(e)
                .message("failed reading root template directory"))?
    )];

    while let Some((path, iter)) = dir_queue.pop() {
        tracing::debug!(
            path = %path.display(),
            "loading directory",
        );

        for item in iter {
            let entry = item?;
            let entry_path = entry.path();
            let entry_type = entry.file_type()
                .map_err(|e| error::Error::from(e)
                    .message("failed loading file type for template file"))?;

            if entry_type.is_file() {
                if entry_path.extension().map_or(true, |ext| ext != "hbs") {
                    tracing::debug!(path = %entry_path.display(), "non handlebars file");
                    continue;
                }

                let name = get_registry_name(directory, &entry_path)?;

                tracing::debug!(
                    name = name,
                    path = %entry_path.display(),
                    "handlebars template",
                );

                registry.register_template_file(name, &entry_path)?;
            } else if entry_type.is_dir() {
                let entry_iter = read_dir(&entry_path)
                    .map_err(|e| error::Error::from(e)
                        .message("failed reading template files directory"))?;

                dir_queue.push((entry_path, entry_iter));
            } else {
                tracing::debug!(
                    path = %entry_path.display(),
                    "symlink"
                );
            }
        }
    }

    Ok(())
}

#[derive(Debug)]
pub struct Templates {
    registry: Handlebars<'static>,
}

impl Templates {
    pub fn built_in() -> error::Result<Self> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(false);

        for (name, source) in BUILT_IN {
            registry.register_template_string(name, source)?;
        }

        Ok(Templates {
            registry
        })
    }

    pub fn from_config(config: &config::Config) -> error::Result<Self> {
        tracing::debug!("creating Templates state");

        let mut templates = Self::built_in()?;
        templates.registry.set_dev_mode(config.settings.templates.dev_mode);

        if let Some(directory) = &config.settings.templates.directory {
            load_template_directory(&mut templates.registry, directory)?;
        }

        Ok(templates)
    }

    pub fn render<N, T>(&self, name: N, data: &T) -> Result<String, handlebars::RenderError>
    where
        N: AsRef<str>,
        T: serde::Serialize,
    {
        self.registry.render(name.as_ref(), data)
    }
}
