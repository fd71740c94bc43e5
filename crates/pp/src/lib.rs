//! The C preprocessor is an external tool: this crate builds its command line
//! from a [`PreprocessorConfig`] and captures the expanded text.

use std::ffi::OsStr;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use anyhow::{Context, Result};
use thiserror::Error;

/// Environment variable naming the preprocessor executable.
pub const CPP_ENV: &str = "QUILLCC_CPP";

/// Executables tried in order when `QUILLCC_CPP` is unset.
const CANDIDATES: &[&str] = &["cpp", "clang", "gcc"];

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("no C preprocessor found (tried {tried}); set QUILLCC_CPP to choose one")]
    NotFound { tried: String },
    #[error("failed to run {}", tool.display())]
    Spawn {
        tool: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} exited with {status}\n{stderr}", tool.display())]
    Failed {
        tool: PathBuf,
        status: ExitStatus,
        stderr: String,
    },
}

/// A macro given on the command line: `NAME` or `NAME=VALUE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroDef {
    pub name: String,
    pub value: Option<String>,
}

impl MacroDef {
    pub fn parse(spec: &str) -> Self {
        match spec.split_once('=') {
            Some((name, value)) => Self {
                name: name.to_string(),
                value: Some(value.to_string()),
            },
            None => Self {
                name: spec.to_string(),
                value: None,
            },
        }
    }
}

impl fmt::Display for MacroDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(v) => write!(f, "{}={}", self.name, v),
            None => f.write_str(&self.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreprocessorConfig {
    /// `-I` directories, searched in order.
    pub user_includes: Vec<PathBuf>,
    /// `-isystem` directories, searched after the user ones.
    pub system_includes: Vec<PathBuf>,
    pub defines: Vec<MacroDef>,
    pub undefs: Vec<String>,
    /// Target triple; only clang-style drivers accept it.
    pub target: Option<String>,
    pub keep_comments: bool,
    pub keep_whitespace: bool,
    pub expand_macros: bool,
}

impl Default for PreprocessorConfig {
    fn default() -> Self {
        Self {
            user_includes: Vec::new(),
            system_includes: Vec::new(),
            defines: Vec::new(),
            undefs: Vec::new(),
            target: None,
            keep_comments: false,
            keep_whitespace: false,
            expand_macros: true,
        }
    }
}

impl PreprocessorConfig {
    pub fn define(&mut self, spec: &str) -> &mut Self {
        self.defines.push(MacroDef::parse(spec));
        self
    }

    pub fn undef(&mut self, name: &str) -> &mut Self {
        self.undefs.push(name.to_string());
        self
    }

    pub fn include(&mut self, dir: impl Into<PathBuf>) -> &mut Self {
        self.user_includes.push(dir.into());
        self
    }

    pub fn system_include(&mut self, dir: impl Into<PathBuf>) -> &mut Self {
        self.system_includes.push(dir.into());
        self
    }
}

/// How the tool wants to be driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    /// A standalone `cpp`.
    Cpp,
    /// `gcc -E`.
    Gcc,
    /// `clang -E`; also accepts `--target`.
    Clang,
}

impl Flavor {
    /// Guess from the executable name (`clang-18`, `x86_64-linux-gnu-gcc`, `clang-cpp`...).
    pub fn of(tool: &Path) -> Self {
        let stem = tool.file_stem().and_then(OsStr::to_str).unwrap_or_default();
        if stem.ends_with("cpp") {
            Flavor::Cpp
        } else if stem.contains("clang") {
            Flavor::Clang
        } else {
            Flavor::Gcc
        }
    }
}

pub struct Preprocessor {
    tool: PathBuf,
    flavor: Flavor,
    config: PreprocessorConfig,
}

impl Preprocessor {
    /// Locate a preprocessor: `QUILLCC_CPP` first, then `cpp`, `clang` and `gcc` on `PATH`.
    pub fn new(config: PreprocessorConfig) -> std::result::Result<Self, PreprocessError> {
        let tool = std::env::var_os(CPP_ENV)
            .map(PathBuf::from)
            .or_else(|| CANDIDATES.iter().find_map(|c| which::which(c).ok()))
            .ok_or_else(|| PreprocessError::NotFound {
                tried: CANDIDATES.join(", "),
            })?;
        log::debug!("using preprocessor {}", tool.display());
        Ok(Self::with_tool(tool, config))
    }

    pub fn with_tool(tool: impl Into<PathBuf>, config: PreprocessorConfig) -> Self {
        let tool = tool.into();
        let flavor = Flavor::of(&tool);
        Self { tool, flavor, config }
    }

    pub fn tool(&self) -> &Path {
        &self.tool
    }

    pub fn flavor(&self) -> Flavor {
        self.flavor
    }

    pub fn config(&self) -> &PreprocessorConfig {
        &self.config
    }

    /// Arguments for preprocessing `input` (`-` reads standard input).
    /// Linemarkers are kept; the lexer uses them for locations.
    pub fn command_args(&self, input: &Path) -> Vec<String> {
        let cfg = &self.config;
        let mut args = Vec::new();
        if self.flavor != Flavor::Cpp {
            args.extend(["-E".to_string(), "-x".to_string(), "c".to_string()]);
        }
        if let Some(triple) = &cfg.target {
            if self.flavor == Flavor::Clang {
                args.push(format!("--target={}", triple));
            }
        }
        if cfg.keep_comments {
            args.push("-C".into());
        }
        if cfg.keep_whitespace {
            args.push("-traditional-cpp".into());
        }
        if !cfg.expand_macros {
            args.push("-fdirectives-only".into());
        }
        for dir in &cfg.user_includes {
            args.push(format!("-I{}", dir.display()));
        }
        for dir in &cfg.system_includes {
            args.push("-isystem".into());
            args.push(dir.display().to_string());
        }
        for def in &cfg.defines {
            args.push(format!("-D{}", def));
        }
        for name in &cfg.undefs {
            args.push(format!("-U{}", name));
        }
        args.push(input.display().to_string());
        args
    }

    pub fn preprocess_file(&self, path: &Path) -> Result<String> {
        if !path.exists() {
            anyhow::bail!("input file not found: {}", path.display());
        }
        self.run(path, None)
            .with_context(|| format!("failed to preprocess {}", path.display()))
    }

    /// Preprocess in-memory text, fed to the tool on standard input.
    pub fn preprocess_source(&self, name: &str, src: &str) -> Result<String> {
        self.run(Path::new("-"), Some(src))
            .with_context(|| format!("failed to preprocess {}", name))
    }

    fn run(&self, input: &Path, stdin: Option<&str>) -> std::result::Result<String, PreprocessError> {
        if self.config.target.is_some() && self.flavor != Flavor::Clang {
            log::warn!("{} does not take a target triple; ignoring it", self.tool.display());
        }
        let args = self.command_args(input);
        log::debug!("{} {}", self.tool.display(), args.join(" "));
        let spawn_err = |source| PreprocessError::Spawn {
            tool: self.tool.clone(),
            source,
        };
        let mut child = Command::new(&self.tool)
            .args(&args)
            .stdin(if stdin.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_err)?;
        // Feed stdin from a thread so a full stdout pipe cannot stall us.
        let writer = match (stdin, child.stdin.take()) {
            (Some(text), Some(mut pipe)) => {
                let text = text.to_string();
                Some(std::thread::spawn(move || pipe.write_all(text.as_bytes())))
            }
            _ => None,
        };
        let output = child.wait_with_output().map_err(spawn_err)?;
        if let Some(writer) = writer {
            if let Ok(Err(e)) = writer.join() {
                log::debug!("preprocessor closed its input early: {}", e);
            }
        }
        if !output.status.success() {
            return Err(PreprocessError::Failed {
                tool: self.tool.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim_end().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
