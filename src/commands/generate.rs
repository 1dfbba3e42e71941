//! `generate` subcommand.
use anyhow::{Context, Result};
use clap::Command;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Writes a man page for `cmd` and one for every nested subcommand into
/// `output_dir`, or the current directory when it is `None`.
///
/// Subcommand pages are named after their full invocation, e.g.
/// `jpq-generate-man.1`. Returns the paths written, parents first.
///
/// # Errors
///
/// Returns an error if the output directory or a page cannot be written.
pub fn generate_man_pages(
    cmd: &Command,
    output_dir: Option<&Path>,
) -> Result<Vec<PathBuf>> {
    let output_dir = match output_dir {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir().context("Opening current directory")?,
    };
    std::fs::create_dir_all(&output_dir)
        .context("create output Man directories")?;

    let mut written = Vec::new();
    render_page(cmd.clone(), &output_dir, cmd.get_name(), &mut written)?;
    Ok(written)
}

fn render_page(
    cmd: Command,
    output_dir: &Path,
    page_name: &str,
    written: &mut Vec<PathBuf>,
) -> Result<()> {
    let path = output_dir.join(format!("{page_name}.1"));
    let mut file = File::create(&path)
        .with_context(|| format!("failed to create {}", path.display()))?;

    // clap_mangen takes the NAME and SYNOPSIS sections from the command name,
    // which only accepts a `&'static str`.
    let name: &'static str = Box::leak(page_name.to_owned().into_boxed_str());
    let page = cmd.clone().name(name).disable_help_subcommand(true);
    clap_mangen::Man::new(page)
        .render(&mut file)
        .with_context(|| format!("failed to render {}", path.display()))?;
    log::debug!("wrote man page {}", path.display());
    written.push(path);

    for sub in cmd.get_subcommands() {
        let sub_name = format!("{page_name}-{}", sub.get_name());
        render_page(sub.clone(), output_dir, &sub_name, written)?;
    }
    Ok(())
}
