// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 ddsfmu contributors

//! Repackaging tool for dds-fmu.
//!
//! `generate` recreates `modelDescription.xml` from the configuration
//! files in an FMU tree, `zip` packages the tree into a `.fmu` archive,
//! `create` chains both. The tool exits 0 on success and 1 on any
//! validation or runtime error.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

#[derive(Parser)]
#[command(
    name = "dds-fmu-repack",
    version,
    about = "Repackage 'dds-fmu' with customised configuration files"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Produce an .fmu zip archive of an FMU root directory
    Zip {
        /// Path to fmu root
        path: PathBuf,
        /// Output file
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Overwrite an existing output file
        #[arg(short, long)]
        force: bool,
        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
    /// Regenerate modelDescription.xml from the configuration files
    Generate {
        /// Path to fmu root
        path: PathBuf,
        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
    /// Generate modelDescription.xml, then zip the FMU
    Create {
        /// Path to fmu root
        path: PathBuf,
        /// Output file
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Overwrite an existing output file
        #[arg(short, long)]
        force: bool,
        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

const DEFAULT_ZIP: &str = "dds-fmu.fmu";

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Zip {
            path,
            output,
            force,
            verbose,
        } => {
            let fmu_path = check_zip_paths(&path)?;
            let out = zip_output_path(output)?;
            zip_fmu(&fmu_path, &out, verbose, force)
        }
        Command::Generate { path, verbose } => {
            let fmu_path = check_generate_paths(&path)?;
            generate(&fmu_path, verbose)
        }
        Command::Create {
            path,
            output,
            force,
            verbose,
        } => {
            let fmu_path = check_generate_paths(&path)?;
            check_zip_paths(&path)?;
            generate(&fmu_path, verbose)?;
            let out = zip_output_path(output)?;
            zip_fmu(&fmu_path, &out, verbose, force)
        }
    }
}

fn check_zip_paths(path: &Path) -> Result<PathBuf> {
    let fmu_path = absolute(path)?;
    for dir in [
        fmu_path.clone(),
        fmu_path.join("resources"),
        fmu_path.join("binaries"),
    ] {
        if !dir.is_dir() {
            bail!("directory does not exist: {}", dir.display());
        }
    }
    Ok(fmu_path)
}

fn check_generate_paths(path: &Path) -> Result<PathBuf> {
    let fmu_path = absolute(path)?;
    let resources = fmu_path.join("resources");
    if !fmu_path.is_dir() {
        bail!("directory does not exist: {}", fmu_path.display());
    }
    if !resources.is_dir() {
        bail!("directory does not exist: {}", resources.display());
    }
    let required = [
        resources.join("config").join("modelDescription.xml"),
        resources.join("config").join("dds").join("ddsfmu_mapping.xml"),
        resources.join("config").join("idl").join("dds-fmu.idl"),
    ];
    for file in required {
        if !file.is_file() {
            bail!("required file does not exist: {}", file.display());
        }
    }
    Ok(fmu_path)
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()
            .context("cannot resolve current directory")?
            .join(path))
    }
}

/// Resolve the output file, forcing the `.fmu` extension.
fn zip_output_path(output: Option<PathBuf>) -> Result<PathBuf> {
    let mut out = match output {
        Some(path) => absolute(&path)?,
        None => absolute(Path::new(DEFAULT_ZIP))?,
    };
    if out.is_dir() || out.file_name().is_none() {
        out = out.join(DEFAULT_ZIP);
    }
    match out.extension().and_then(|e| e.to_str()) {
        Some("fmu") => {}
        Some(_) | None => {
            eprintln!("WARNING: forcing .fmu extension for {}", out.display());
            out.set_extension("fmu");
        }
    }
    Ok(out)
}

fn generate(fmu_path: &Path, verbose: bool) -> Result<()> {
    let rendered = ddsfmu::config::generate_model_description(fmu_path)
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    if verbose {
        println!("{}", rendered);
    }
    ddsfmu::config::write_model_description(&rendered, fmu_path)
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    if verbose {
        println!(
            "Wrote {}",
            fmu_path.join("modelDescription.xml").display()
        );
    }
    Ok(())
}

fn zip_fmu(fmu_root: &Path, out_file: &Path, verbose: bool, force: bool) -> Result<()> {
    if out_file.exists() {
        if !force {
            bail!(
                "file already exists: {}\nforce overwriting with the -f flag",
                out_file.display()
            );
        }
        if verbose {
            println!("INFO: overwriting existing file");
        }
    }
    if verbose {
        println!("Packaging directory: {}", fmu_root.display());
        println!("Writing to file: {}", out_file.display());
    }

    let file = File::create(out_file)
        .with_context(|| format!("cannot create {}", out_file.display()))?;
    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in WalkDir::new(fmu_root).sort_by_file_name() {
        let entry = entry.context("cannot walk FMU tree")?;
        let path = entry.path();
        let relative = path
            .strip_prefix(fmu_root)
            .context("walked outside the FMU root")?;
        if relative.as_os_str().is_empty() {
            continue;
        }
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        if path.is_dir() {
            zip.add_directory(&name, options)
                .with_context(|| format!("cannot add directory {}", name))?;
        } else {
            if verbose {
                println!("  adding: {}", name);
            }
            zip.start_file(&name, options)
                .with_context(|| format!("cannot add file {}", name))?;
            let mut input = File::open(path)
                .with_context(|| format!("cannot open {}", path.display()))?;
            io::copy(&mut input, &mut zip)
                .with_context(|| format!("cannot compress {}", path.display()))?;
        }
    }
    zip.finish().context("cannot finalize archive")?;
    if verbose {
        println!("Done: {}", out_file.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_path_forces_fmu_extension() {
        let out = zip_output_path(Some(PathBuf::from("/tmp/bundle.zip"))).expect("path");
        assert_eq!(out.extension().and_then(|e| e.to_str()), Some("fmu"));
    }

    #[test]
    fn missing_directories_fail_validation() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(check_zip_paths(dir.path()).is_err());
        std::fs::create_dir_all(dir.path().join("resources")).expect("mkdir");
        std::fs::create_dir_all(dir.path().join("binaries")).expect("mkdir");
        assert!(check_zip_paths(dir.path()).is_ok());
    }
}
