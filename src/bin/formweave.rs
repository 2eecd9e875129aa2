use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};

use formweave::schema;

#[derive(Parser, Debug)]
#[command(name = "formweave", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check a structure/enums document pair for structural problems.
    Validate(ValidateArgs),
    /// Build the form metadata (fields, layout, values) as JSON.
    Build(BuildArgs),
}

#[derive(Parser, Debug)]
struct ValidateArgs {
    /// Field-tree structure JSON.
    #[arg(long)]
    structure: PathBuf,

    /// Enumeration tables JSON.
    #[arg(long)]
    enums: PathBuf,

    /// Key of the root node.
    #[arg(long)]
    root: String,
}

#[derive(Parser, Debug)]
struct BuildArgs {
    /// Field-tree structure JSON.
    #[arg(long)]
    structure: PathBuf,

    /// Enumeration tables JSON.
    #[arg(long)]
    enums: PathBuf,

    /// Key of the root node.
    #[arg(long)]
    root: String,

    /// Form variant to build for.
    #[arg(long, value_enum, default_value_t = ModeChoice::Standard)]
    mode: ModeChoice,

    /// Output path; stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeChoice {
    Standard,
    NewEntry,
}

impl From<ModeChoice> for schema::FormMode {
    fn from(choice: ModeChoice) -> Self {
        match choice {
            ModeChoice::Standard => Self::Standard,
            ModeChoice::NewEntry => Self::NewEntry,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Validate(args) => cmd_validate(args),
        Command::Build(args) => cmd_build(args),
    }
}

fn cmd_validate(args: ValidateArgs) -> anyhow::Result<()> {
    let docs = schema::load_documents(&args.structure, &args.enums)?;
    schema::validate_structure(&docs.structure)?;
    let root = schema::find_root(&docs.structure, &args.root)?;

    for missing in missing_enum_refs(&docs) {
        eprintln!("warning: enumeration '{missing}' is referenced but not defined");
    }

    let file_fields = schema::file_field_ids(&docs.structure);
    eprintln!(
        "ok: {} top-level sections, {} enum tables, {} file fields",
        root.children.len(),
        docs.enums.len(),
        file_fields.len()
    );
    Ok(())
}

fn cmd_build(args: BuildArgs) -> anyhow::Result<()> {
    let docs = schema::load_documents(&args.structure, &args.enums)?;
    let meta = formweave::build_metadata(
        &docs.structure,
        &docs.enums,
        &args.root,
        args.mode.into(),
    )?;

    let json = serde_json::to_string_pretty(&meta).context("serialize metadata")?;
    match &args.out {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create output dir '{}'", parent.display()))?;
            }
            std::fs::write(path, json)
                .with_context(|| format!("write metadata '{}'", path.display()))?;
            eprintln!("wrote {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn missing_enum_refs(docs: &schema::SchemaDocuments) -> Vec<String> {
    let mut missing = Vec::new();
    for node in &docs.structure {
        collect_missing(node, docs, &mut missing);
    }
    missing.sort();
    missing.dedup();
    missing
}

fn collect_missing(node: &schema::FieldNode, docs: &schema::SchemaDocuments, out: &mut Vec<String>) {
    if let Some(name) = &node.enum_ref {
        if !docs.enums.contains_key(name) {
            out.push(name.clone());
        }
    }
    for child in &node.children {
        collect_missing(child, docs, out);
    }
}
