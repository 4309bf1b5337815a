mod company;

pub use company::{AssetSettings, Company, Config, PdfSettings};

use crate::error::{InvoiceError, Result};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

/// Get the config directory path (XDG config dir, falling back to ~/.hekma-invoice/)
pub fn config_dir() -> Result<PathBuf> {
    if let Some(proj_dirs) = ProjectDirs::from("", "", "hekma-invoice") {
        return Ok(proj_dirs.config_dir().to_path_buf());
    }

    let home = dirs_home().ok_or_else(|| {
        InvoiceError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not determine home directory",
        ))
    })?;

    Ok(home.join(".hekma-invoice"))
}

fn dirs_home() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

/// Expand ~ in paths
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs_home() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Resolve the PDF output directory; relative paths are taken from the config dir.
pub fn resolve_output_dir(output_dir: &str, config_dir: &Path) -> PathBuf {
    let expanded = expand_path(output_dir);
    if expanded.is_absolute() {
        expanded
    } else {
        config_dir.join(expanded)
    }
}

/// Resolve an asset location. URLs pass through untouched.
pub fn resolve_asset(location: &str, config_dir: &Path) -> String {
    if location.starts_with("http://") || location.starts_with("https://") {
        return location.to_string();
    }
    let expanded = expand_path(location);
    if expanded.is_absolute() {
        expanded.display().to_string()
    } else {
        config_dir.join(expanded).display().to_string()
    }
}

/// Load the main config.toml
pub fn load_config(config_dir: &Path) -> Result<Config> {
    let path = config_dir.join("config.toml");
    if !path.exists() {
        return Err(InvoiceError::ConfigFileNotFound(path));
    }
    let content = fs::read_to_string(&path)?;
    let mut config: Config =
        toml::from_str(&content).map_err(|e| InvoiceError::ConfigParse { path, source: e })?;

    let assets = &mut config.assets;
    for slot in [&mut assets.logo, &mut assets.signature, &mut assets.font] {
        if let Some(location) = slot.as_mut() {
            *location = resolve_asset(location, config_dir);
        }
    }
    Ok(config)
}

/// Template content for config.toml
pub const CONFIG_TEMPLATE: &str = r#"[company]
name = "EL HEKMA ENGINEERING OFFICE"
name_ar = "مكتب الحكمة الهندسي"
seller_name = "EL HEKMA Engineering Office"
tagline = "Professional Engineering Solutions"
address = "41 Al-Mawardi Street, Al-Qasr Al-Aini, Cairo, Egypt"
contact = "Tel: +20 11 47304880 | Fax: +2027932115"
email = "el_hekma2013@yahoo.com"
website = "https://heomed.com/"
copyright = "© 2024 EL HEKMA Engineering Office. All rights reserved."
bar_text = "HEKMA ENGINEERING OFFICE - Professional Solutions"

[assets]
# Paths are relative to this directory; http(s) URLs are fetched.
# A missing asset never stops a document from being generated.
# logo = "assets/logo.png"
# signature = "assets/signature.png"
# font = "assets/DejaVuSans.ttf"   # Unicode font with Latin + Arabic glyphs

[pdf]
output_dir = "output"
"#;
