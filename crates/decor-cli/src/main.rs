use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use decor_contracts::access::EntitlementStatus;
use decor_contracts::catalog::{RoomCatalog, RoomKind, StyleCatalog, StyleKind};
use decor_contracts::prompts::{build_prompt, MAX_PROMPT_CHARS};
use decor_engine::pipeline::{DEFAULT_CFG_SCALE, DEFAULT_STEPS};
use decor_engine::{
    DesignGenerator, DesignStudio, GenerationError, GenerationParams, GenerationRequest,
    StabilityConfig,
};
use serde_json::{json, Value};

#[derive(Debug, Parser)]
#[command(name = "decor", version, about = "Redesign room photos in a chosen interior style")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List room types.
    Rooms,
    /// List design styles.
    Styles(StylesArgs),
    /// Print the prompt pair for a room and style.
    Prompt(PromptArgs),
    /// Print the multipart fields a generation would send, without sending.
    Form(FormArgs),
    /// Generate one redesigned photo.
    Generate(GenerateArgs),
}

#[derive(Debug, Parser)]
struct StylesArgs {
    /// Only styles carrying this tag, e.g. `warm` or `minimal`.
    #[arg(long)]
    tag: Option<String>,
}

#[derive(Debug, Parser)]
struct PromptArgs {
    #[arg(long)]
    room: RoomKind,
    #[arg(long)]
    style: StyleKind,
}

#[derive(Debug, Parser)]
struct DesignArgs {
    #[arg(long)]
    image: PathBuf,
    #[arg(long)]
    room: RoomKind,
    #[arg(long)]
    style: StyleKind,
    #[arg(long)]
    image_strength: f64,
    #[arg(long, default_value_t = DEFAULT_STEPS)]
    steps: u32,
    #[arg(long, default_value_t = DEFAULT_CFG_SCALE)]
    cfg_scale: f64,
    #[arg(long)]
    style_preset: Option<String>,
    /// Replaces the stock negative prompt; an empty value sends none.
    #[arg(long)]
    negative: Option<String>,
}

#[derive(Debug, Parser)]
struct FormArgs {
    #[command(flatten)]
    design: DesignArgs,
}

#[derive(Debug, Parser)]
struct GenerateArgs {
    #[command(flatten)]
    design: DesignArgs,
    #[arg(long)]
    out: PathBuf,
    #[arg(long)]
    events: Option<PathBuf>,
    /// Caller holds an active subscription.
    #[arg(long, conflicts_with = "not_entitled")]
    entitled: bool,
    /// Caller has no subscription (the default).
    #[arg(long)]
    not_entitled: bool,
}

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            if let Some(GenerationError::AccessDenied(denied)) =
                err.downcast_ref::<GenerationError>()
            {
                eprintln!("decor: {denied}");
                std::process::exit(2);
            }
            eprintln!("decor error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Rooms => {
            for room in RoomCatalog::standard().list() {
                println!("{:<14} {:<14} {}", room.slug, room.name, room.description);
            }
            Ok(0)
        }
        Command::Styles(args) => {
            let catalog = StyleCatalog::standard();
            let styles = match args.tag.as_deref() {
                Some(tag) => catalog.by_tag(tag),
                None => catalog.list().cloned().collect(),
            };
            for style in &styles {
                println!("{:<20} {:<20} {}", style.slug, style.name, style.tags.join(", "));
            }
            Ok(if styles.is_empty() { 1 } else { 0 })
        }
        Command::Prompt(args) => run_prompt(args),
        Command::Form(args) => run_form(args),
        Command::Generate(args) => run_generate(args),
    }
}

fn run_prompt(args: PromptArgs) -> Result<i32> {
    let prompts = build_prompt(args.room, args.style);
    let room = RoomCatalog::standard()
        .get(args.room.slug())
        .with_context(|| format!("room {} missing from catalog", args.room))?;
    let style = StyleCatalog::standard()
        .get(args.style.slug())
        .with_context(|| format!("style {} missing from catalog", args.style))?;
    let payload = json!({
        "room": args.room,
        "room_description": room.description,
        "style": args.style,
        "style_tags": style.tags,
        "positive": prompts.positive,
        "negative": prompts.negative,
        "positive_chars": prompts.positive.chars().count(),
        "max_chars": MAX_PROMPT_CHARS,
        "fits": prompts.fits_within(MAX_PROMPT_CHARS),
    });
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(if prompts.fits_within(MAX_PROMPT_CHARS) { 0 } else { 1 })
}

fn run_form(args: FormArgs) -> Result<i32> {
    let request = design_request(&args.design)?;
    // Previewing never sends, so a placeholder key is enough.
    let config = StabilityConfig::from_env_or_key("preview")?;
    let generator = DesignGenerator::new(config)?;
    let form = generator.preview_form(&request)?;
    let payload = json!({
        "endpoint": generator.config().endpoint()?.to_string(),
        "fields": Value::Object(form.manifest()),
    });
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(0)
}

fn run_generate(args: GenerateArgs) -> Result<i32> {
    let request = design_request(&args.design)?;
    let events_path = args
        .events
        .clone()
        .unwrap_or_else(|| args.out.join("events.jsonl"));
    let generator = DesignGenerator::new(StabilityConfig::from_env()?)?;
    let mut studio = DesignStudio::new(&args.out, &events_path, generator)?;
    let entitlement = EntitlementStatus::from(args.entitled && !args.not_entitled);

    let outcome = studio.generate(request, &entitlement, None);
    studio.finish()?;
    let saved = outcome?;
    println!(
        "Saved {} (seed {}, {}) in {:.1}s",
        saved.image_path.display(),
        saved.seed,
        saved.finish_reason,
        saved.latency_s
    );
    println!("Receipt {}", saved.receipt_path.display());
    println!("Session {} in {}", studio.session_id(), studio.out_dir().display());
    Ok(0)
}

fn design_request(args: &DesignArgs) -> Result<GenerationRequest> {
    let source_image =
        fs::read(&args.image).with_context(|| format!("failed reading {}", args.image.display()))?;
    let params = GenerationParams::new(
        args.image_strength,
        args.steps,
        args.cfg_scale,
        args.style_preset.clone(),
    )?;
    Ok(GenerationRequest {
        source_image,
        room: args.room,
        style: args.style,
        params,
        negative_prompt: args.negative.clone(),
    })
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use decor_contracts::catalog::{RoomKind, StyleKind};

    use super::{design_request, Cli, Command};

    #[test]
    fn generate_args_parse_catalog_slugs() {
        let cli = Cli::try_parse_from([
            "decor",
            "generate",
            "--image",
            "room.jpg",
            "--room",
            "kitchen",
            "--style",
            "mid-century-modern",
            "--image-strength",
            "0.35",
            "--out",
            "out",
            "--entitled",
        ])
        .unwrap();
        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.design.room, RoomKind::Kitchen);
        assert_eq!(args.design.style, StyleKind::MidCenturyModern);
        assert_eq!(args.design.steps, 30);
        assert_eq!(args.design.cfg_scale, 7.0);
        assert!(args.entitled);
    }

    #[test]
    fn image_strength_is_required() {
        let parsed = Cli::try_parse_from([
            "decor", "form", "--image", "room.jpg", "--room", "kitchen", "--style", "gothic",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn unknown_room_is_rejected_by_parser() {
        let parsed = Cli::try_parse_from(["decor", "prompt", "--room", "garage", "--style", "gothic"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn entitlement_flags_conflict_and_default_to_not_entitled() {
        let base = [
            "decor",
            "generate",
            "--image",
            "room.jpg",
            "--room",
            "bedroom",
            "--style",
            "bohemian",
            "--image-strength",
            "0.3",
            "--out",
            "out",
        ];
        let cli = Cli::try_parse_from(base).unwrap();
        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert!(!args.entitled);

        let cli = Cli::try_parse_from(base.iter().copied().chain(["--not-entitled"])).unwrap();
        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert!(args.not_entitled);

        let both = Cli::try_parse_from(
            base.iter()
                .copied()
                .chain(["--entitled", "--not-entitled"]),
        );
        assert!(both.is_err());
    }

    #[test]
    fn negative_override_reaches_the_request() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let image = temp.path().join("room.jpg");
        std::fs::write(&image, b"raw bytes are read, not decoded, here")?;
        let image_arg = image.to_string_lossy().to_string();
        let cli = Cli::try_parse_from([
            "decor",
            "form",
            "--image",
            image_arg.as_str(),
            "--room",
            "home-office",
            "--style",
            "minimalist",
            "--image-strength",
            "0.5",
            "--negative",
            "",
        ])?;
        let Command::Form(args) = cli.command else {
            panic!("expected form");
        };
        let request = design_request(&args.design)?;
        assert_eq!(request.negative_prompt.as_deref(), Some(""));
        assert_eq!(request.prompts().negative, "");
        assert!(!request.prompts().positive.is_empty());
        Ok(())
    }

    #[test]
    fn styles_accept_a_tag_filter() {
        let cli = Cli::try_parse_from(["decor", "styles", "--tag", "warm"]).unwrap();
        let Command::Styles(args) = cli.command else {
            panic!("expected styles");
        };
        assert_eq!(args.tag.as_deref(), Some("warm"));
    }
}
