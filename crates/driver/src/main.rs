mod backend;

use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};

use backend::{backend_for, plan_artifact, BackendKind, CodegenOptions, OutputRequest};
use lex::{c_syntax, tokenize, CDialect, CStandard, Diagnostics, SourceBuffer};
use parse::{dump, parse_source, Node};
use pp::{MacroDef, Preprocessor, PreprocessorConfig};

#[derive(Parser, Debug)]
#[command(
    name = "quillcc",
    about = "Quill C front end",
    long_about = "Quill C front end: preprocess with the system cpp, lex and parse C89 through C23 with GNU extensions",
    version
)]
struct Cli {
    /// Log front-end activity (debug level; RUST_LOG overrides)
    #[arg(short = 'v', long = "verbose", global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the external preprocessor and print its output
    Preprocess(FrontArgs),
    /// Preprocess then lex a C source file and print tokens
    Tokens(FrontArgs),
    /// Preprocess, lex, parse and print the AST
    Ast(FrontArgs),
    /// Preprocess, lex and parse; only report diagnostics
    Check(FrontArgs),
    /// Run the front end, then hand the tree to a code generator
    Build(BuildArgs),
}

#[derive(Args, Debug)]
struct FrontArgs {
    /// Input C file
    input: PathBuf,
    /// Defines in the form NAME or NAME=VALUE
    #[arg(short = 'D', value_name = "NAME[=VALUE]")]
    define: Vec<String>,
    /// Undefine macro NAME
    #[arg(short = 'U', value_name = "NAME")]
    undef: Vec<String>,
    /// Add an include search directory (repeatable)
    #[arg(short = 'I', value_name = "DIR")]
    include: Vec<PathBuf>,
    /// Add a system include directory (repeatable)
    #[arg(long = "isystem", value_name = "DIR")]
    isystem: Vec<PathBuf>,
    /// Target triple, forwarded to clang-style preprocessors
    #[arg(long = "target", value_name = "TRIPLE")]
    target: Option<String>,
    /// Language standard: c89, c99, c11, c17, c23 or their gnu* variants
    #[arg(long = "std", value_name = "STD", default_value = "gnu17")]
    std: String,
    /// The input is already preprocessed; do not run cpp
    #[arg(long = "preprocessed")]
    preprocessed: bool,
}

#[derive(Args, Debug)]
struct BuildArgs {
    #[command(flatten)]
    front: FrontArgs,
    /// Output path (default: stem with the matching suffix, or a.out)
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,
    /// Emit assembly (.s) instead of linking
    #[arg(short = 'S', long = "emit-asm")]
    emit_asm: bool,
    /// Compile only to object (.o), do not link
    #[arg(short = 'c', long = "compile-only")]
    compile_only: bool,
    /// Emit LLVM IR (.ll)
    #[arg(long = "emit-llvm")]
    emit_llvm: bool,
    /// Optimization level
    #[arg(short = 'O', value_name = "LEVEL", value_parser = ["0", "1", "2", "3", "s", "z"])]
    opt: Option<String>,
    /// Generate debug info
    #[arg(short = 'g')]
    debug: bool,
    /// Code generator
    #[arg(long = "backend", value_enum, default_value = "llvm")]
    backend: BackendKind,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {
        Commands::Preprocess(args) => cmd_preprocess(&args),
        Commands::Tokens(args) => cmd_tokens(&args),
        Commands::Ast(args) => cmd_ast(&args),
        Commands::Check(args) => cmd_check(&args),
        Commands::Build(args) => cmd_build(&args),
    }
}

impl FrontArgs {
    fn dialect(&self) -> Result<CDialect> {
        let (standard, gnu) =
            CStandard::parse(&self.std).ok_or_else(|| anyhow!("unknown language standard '{}'", self.std))?;
        Ok(CDialect { standard, gnu })
    }

    fn preprocessor_config(&self) -> PreprocessorConfig {
        PreprocessorConfig {
            user_includes: self.include.clone(),
            system_includes: self.isystem.clone(),
            defines: self.define.iter().map(|d| MacroDef::parse(d)).collect(),
            undefs: self.undef.clone(),
            target: self.target.clone(),
            ..PreprocessorConfig::default()
        }
    }
}

/// The translation unit text, through cpp unless `--preprocessed`.
fn preprocess_capture(args: &FrontArgs) -> Result<String> {
    if !args.input.exists() {
        bail!("input file not found: {}", args.input.display());
    }
    if args.preprocessed {
        return fs::read_to_string(&args.input).with_context(|| format!("failed to read {}", args.input.display()));
    }
    let pp = Preprocessor::new(args.preprocessor_config())?;
    pp.preprocess_file(&args.input)
}

fn load_source(args: &FrontArgs) -> Result<SourceBuffer> {
    let text = preprocess_capture(args)?;
    Ok(SourceBuffer::new(&args.input.display().to_string(), text))
}

/// Render diagnostics to stderr and turn them into the command's failure.
fn report(diags: &Diagnostics) -> Result<()> {
    if !diags.has_errors() {
        return Ok(());
    }
    diags.emit_to_stderr();
    bail!("{} error(s) generated", diags.error_count())
}

fn front_end(args: &FrontArgs) -> Result<Node> {
    let dialect = args.dialect()?;
    let buf = load_source(args)?;
    let syntax = c_syntax(dialect);
    log::info!(
        "parsing {} as {} ({} keywords)",
        buf.name(),
        syntax.version(),
        syntax.keyword_count()
    );
    let (tu, diags) = parse_source(&buf, &syntax);
    report(&diags)?;
    Ok(tu)
}

fn cmd_preprocess(args: &FrontArgs) -> Result<()> {
    let pre = preprocess_capture(args)?;
    print!("{}", pre);
    Ok(())
}

fn cmd_tokens(args: &FrontArgs) -> Result<()> {
    let dialect = args.dialect()?;
    let buf = load_source(args)?;
    let syntax = c_syntax(dialect);
    let mut diags = Diagnostics::new();
    let tokens = tokenize(&buf, &syntax, &mut diags);
    for tok in tokens.iter() {
        println!("{} {:?} {}", tok.location, tok.kind, tok);
    }
    report(&diags)
}

fn cmd_ast(args: &FrontArgs) -> Result<()> {
    let tu = front_end(args)?;
    print!("{}", dump(&tu));
    Ok(())
}

fn cmd_check(args: &FrontArgs) -> Result<()> {
    let tu = front_end(args)?;
    let decls = tu.children.iter().filter(|c| c.kind.is_declaration()).count();
    eprintln!("[quillcc] {}: {} top-level declarations, no errors", args.input.display(), decls);
    Ok(())
}

fn cmd_build(args: &BuildArgs) -> Result<()> {
    let tu = front_end(&args.front)?;
    let request = OutputRequest {
        output: args.output.clone(),
        emit_asm: args.emit_asm,
        compile_only: args.compile_only,
        emit_llvm: args.emit_llvm,
    };
    let artifact = plan_artifact(&args.front.input, &request);
    let opts = CodegenOptions {
        opt_level: args.opt.clone(),
        debug_info: args.debug,
        target: args.front.target.clone(),
    };
    let backend = backend_for(args.backend);
    eprintln!(
        "[quillcc] {} backend: would write {}",
        backend.kind().name(),
        artifact.path.display()
    );
    backend.generate(&tu, &artifact, &opts)
}
