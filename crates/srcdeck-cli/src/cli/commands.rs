use super::CliError;
use super::helpers::{load_activation, load_frame, load_value_table};
use srcdeck_core::common::fixed::LinkIndex;
use srcdeck_core::common::geometry::{WorldAxis, WorldRotation};
use srcdeck_core::common::values::ValueTable;
use srcdeck_core::domain::{SourceError, SourceKind, TargetCode};
use srcdeck_core::modules::BuildContext;
use srcdeck_core::modules::serialization::write_text_artifact;
use srcdeck_core::modules::sources::SourceModel;
use std::path::PathBuf;
use tracing::info;

#[derive(clap::Args)]
pub(super) struct WriteArgs {
    /// Flat JSON object of source variables
    #[arg(long)]
    variables: PathBuf,

    /// JSON frame (origin, axes and link points) the source is placed on
    #[arg(long)]
    frame: Option<PathBuf>,

    /// Source key; every variable read is prefixed with it
    #[arg(long)]
    name: String,

    /// Source kind; read from `<name>SourceType` when omitted
    #[arg(long)]
    kind: Option<String>,

    /// Link point on the frame (0 = origin, negative = reversed axis)
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    link: i64,

    /// Target transport code: mcnp, phits or fluka
    #[arg(long)]
    code: String,

    /// World axis to rotate the placed source about
    #[arg(long, requires = "rotate_angle")]
    rotate_axis: Option<String>,

    /// Rotation angle in degrees
    #[arg(long, requires = "rotate_axis", allow_hyphen_values = true)]
    rotate_angle: Option<f64>,

    /// Cell boxes and activity table for an activation source
    #[arg(long)]
    activation: Option<PathBuf>,

    /// Write the cards here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(super) fn run_write_command(args: WriteArgs) -> Result<i32, CliError> {
    let code = TargetCode::parse(&args.code).ok_or_else(|| {
        CliError::Usage(format!(
            "unknown target code '{}'; expected mcnp, phits or fluka",
            args.code
        ))
    })?;
    let table = load_value_table(&args.variables)?;
    let kind = resolve_kind(&table, &args.name, args.kind.as_deref())?;
    let frame = load_frame(args.frame.as_deref())?;

    let mut model = SourceModel::new(kind, args.name.as_str());
    model.create_all(&table, &frame, LinkIndex(args.link))?;

    if let Some(path) = &args.activation {
        let input = load_activation(path)?;
        let activation = model.activation_mut().ok_or_else(|| {
            CliError::Usage(format!(
                "--activation given but source '{}' is a {} source",
                args.name, kind
            ))
        })?;
        let accepted = activation.sample(&input.cells, &input.field);
        info!(accepted, "activation points sampled");
    }

    if let (Some(axis), Some(angle)) = (&args.rotate_axis, args.rotate_angle) {
        let axis = WorldAxis::parse(axis).ok_or_else(|| {
            CliError::Usage(format!("unknown rotation axis '{}'; expected x, y or z", axis))
        })?;
        model.rotate(&WorldRotation::about(axis, angle))?;
    }

    let mut context = BuildContext::new();
    context.insert(model)?;
    let deck = context.require(&args.name)?.write(code)?;

    match &args.output {
        Some(path) => {
            write_text_artifact(path, &deck).map_err(|error| {
                SourceError::io_system(
                    "IO.OUTPUT_WRITE",
                    format!("failed to write '{}': {}", path.display(), error),
                )
            })?;
            info!(path = %path.display(), "deck written");
        }
        None => print!("{}", deck),
    }
    Ok(0)
}

fn resolve_kind(
    table: &ValueTable,
    name: &str,
    explicit: Option<&str>,
) -> Result<SourceKind, CliError> {
    let token = match explicit {
        Some(token) => token.to_string(),
        None => table.evaluate::<String>(&format!("{name}SourceType")).map_err(SourceError::from)?,
    };
    SourceKind::parse(&token).ok_or_else(|| {
        CliError::Source(SourceError::configuration(
            "CONFIG.SOURCE_TYPE",
            format!("unknown source kind '{}'", token),
        ))
    })
}

pub(super) fn run_kinds_command() -> Result<i32, CliError> {
    println!("{:<16}{:<7}{:<7}{}", "kind", "MCNP", "PHITS", "FLUKA");
    for kind in SourceKind::ALL {
        let marks = TargetCode::ALL.map(|code| if kind.supports(code) { "yes" } else { "-" });
        println!(
            "{:<16}{:<7}{:<7}{}",
            kind.as_str(),
            marks[0],
            marks[1],
            marks[2]
        );
    }
    Ok(0)
}
