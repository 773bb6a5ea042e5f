//! LaTeX markup to PNG pages.
//!
//! Wraps markup in a small fixed-geometry document, compiles it with
//! pdflatex, and splits the PDF into page images with pdftoppm. Pages land
//! under the media directory so gateways can attach them by path.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::{bail, Context, Result};
use tokio::process::Command;
use tracing::debug;
use uuid::Uuid;

use crate::config::schema::LatexConfig;
use crate::utils::helpers::{ensure_dir, move_file};

pub struct LatexRenderer {
    config: LatexConfig,
    output_dir: PathBuf,
}

impl LatexRenderer {
    pub fn new(config: LatexConfig, media_dir: &Path) -> Self {
        Self {
            config,
            output_dir: media_dir.join("latex"),
        }
    }

    fn document(&self, markup: &str) -> String {
        format!(
            "\\documentclass{{article}}\n\
             \\usepackage[paperwidth={}pt,paperheight={}pt,margin={}pt]{{geometry}}\n\
             \\usepackage{{xcolor}}\n\
             \\usepackage{{graphicx}}\n\
             \\usepackage{{amsmath}}\n\
             \\usepackage{{mhchem}}\n\
             \\usepackage{{siunitx}}\n\
             \\begin{{document}}\n\
             \\noindent {}\n\
             \\end{{document}}\n",
            self.config.paper_width, self.config.paper_height, self.config.margin, markup
        )
    }

    /// Render `markup` to one PNG per page, named LaTeX0.png, LaTeX1.png,
    /// ... in document order.
    pub async fn render(&self, markup: &str) -> Result<Vec<PathBuf>> {
        let scratch = tempfile::tempdir().context("create latex scratch dir")?;
        let tex_path = scratch.path().join("input.tex");
        tokio::fs::write(&tex_path, self.document(markup))
            .await
            .context("write latex input")?;

        // -no-shell-escape keeps arbitrary markup from running commands.
        let output = Command::new(&self.config.pdflatex_binary)
            .args([
                "-interaction=nonstopmode",
                "-halt-on-error",
                "-no-shell-escape",
                "input.tex",
            ])
            .current_dir(scratch.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .context("pdflatex failed to start\n  Install: sudo apt install texlive")?;
        if !output.status.success() {
            bail!(
                "pdflatex failed: {}",
                compile_error_line(&String::from_utf8_lossy(&output.stdout))
            );
        }

        let status = Command::new(&self.config.pdftoppm_binary)
            .args(["-png", "input.pdf", "page"])
            .current_dir(scratch.path())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await
            .context("pdftoppm failed to start\n  Install: sudo apt install poppler-utils")?;
        if !status.success() {
            bail!("pdftoppm failed ({})", status);
        }

        let pages = collect_pages(scratch.path())?;
        if pages.is_empty() {
            bail!("pdftoppm produced no pages");
        }

        let run_dir = ensure_dir(self.output_dir.join(Uuid::new_v4().to_string()));
        let mut rendered = Vec::with_capacity(pages.len());
        for (i, page) in pages.iter().enumerate() {
            let dest = run_dir.join(format!("LaTeX{i}.png"));
            move_file(page, &dest)?;
            rendered.push(dest);
        }
        debug!(
            "Rendered {} latex page(s) into {}",
            rendered.len(),
            run_dir.display()
        );
        Ok(rendered)
    }
}

/// First error line from a pdflatex transcript.
fn compile_error_line(log: &str) -> String {
    log.lines()
        .find(|line| line.starts_with('!'))
        .unwrap_or("see transcript")
        .trim()
        .to_string()
}

/// Page images written by pdftoppm, in page order.
fn collect_pages(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut pages: Vec<PathBuf> = std::fs::read_dir(dir)
        .context("list latex scratch dir")?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .map(|name| name.starts_with("page-") && name.ends_with(".png"))
                .unwrap_or(false)
        })
        .collect();
    // pdftoppm zero-pads page numbers to a uniform width per document, so
    // lexical order is page order.
    pages.sort();
    Ok(pages)
}
