use chrono::{Datelike, Local};
use std::path::{Path, PathBuf};

/// Generate default export filename with format: ghg-emissions-{YYMMDD}.{extension}
pub fn generate_default_export_filename(output_dir: &Path, extension: &str) -> PathBuf {
    let now = Local::now();
    let year = now.year() % 100; // Get last 2 digits of year
    let month = now.month();
    let day = now.day();

    let filename = format!(
        "ghg-emissions-{:02}{:02}{:02}.{}",
        year, month, day, extension
    );
    output_dir.join(filename)
}

/// Turn a chart title fragment into a file-system friendly stem
pub fn slugify(label: &str) -> String {
    let mut slug = String::with_capacity(label.len());
    let mut last_dash = true;
    for c in label.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        slug.push_str("chart");
    }
    slug
}
