//! Code generation hand-off. No generator exists yet: `build` runs the front
//! end, works out the artifact it was asked for, and stops at the backend.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use clap::ValueEnum;
use parse::Node;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    Llvm,
    Rust,
    Zig,
    C,
}

impl BackendKind {
    pub fn name(self) -> &'static str {
        match self {
            BackendKind::Llvm => "llvm",
            BackendKind::Rust => "rust",
            BackendKind::Zig => "zig",
            BackendKind::C => "c",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Executable,
    Object,
    Assembly,
    LlvmIr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub path: PathBuf,
}

/// What `build` was asked to produce.
#[derive(Debug, Clone, Default)]
pub struct OutputRequest {
    pub output: Option<PathBuf>,
    pub emit_asm: bool,
    pub compile_only: bool,
    pub emit_llvm: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CodegenOptions {
    pub opt_level: Option<String>,
    pub debug_info: bool,
    pub target: Option<String>,
}

/// `-S` wins over `-c`; an `-o x.o` without either means an object file.
/// Without `-o` the artifact is named after the input stem, or `a.out`.
pub fn plan_artifact(input: &Path, req: &OutputRequest) -> Artifact {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "out".to_string());

    let kind = if req.emit_llvm {
        ArtifactKind::LlvmIr
    } else if req.emit_asm {
        ArtifactKind::Assembly
    } else if req.compile_only || req.output.as_ref().is_some_and(|p| p.extension().is_some_and(|e| e == "o")) {
        ArtifactKind::Object
    } else {
        ArtifactKind::Executable
    };

    let path = match (&req.output, kind) {
        (Some(o), _) => o.clone(),
        (None, ArtifactKind::LlvmIr) => PathBuf::from(format!("{}.ll", stem)),
        (None, ArtifactKind::Assembly) => PathBuf::from(format!("{}.s", stem)),
        (None, ArtifactKind::Object) => PathBuf::from(format!("{}.o", stem)),
        (None, ArtifactKind::Executable) => PathBuf::from("a.out"),
    };
    Artifact { kind, path }
}

pub trait Backend {
    fn kind(&self) -> BackendKind;

    fn generate(&self, tu: &Node, artifact: &Artifact, opts: &CodegenOptions) -> Result<()>;
}

struct Unimplemented(BackendKind);

impl Backend for Unimplemented {
    fn kind(&self) -> BackendKind {
        self.0
    }

    fn generate(&self, tu: &Node, artifact: &Artifact, opts: &CodegenOptions) -> Result<()> {
        log::debug!(
            "{} backend: {} top-level declarations, {:?} -> {} (opt {:?}, debug {}, target {:?})",
            self.0.name(),
            tu.children.len(),
            artifact.kind,
            artifact.path.display(),
            opts.opt_level,
            opts.debug_info,
            opts.target
        );
        bail!("the {} backend is not implemented", self.0.name())
    }
}

pub fn backend_for(kind: BackendKind) -> Box<dyn Backend> {
    Box::new(Unimplemented(kind))
}
