use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::info;

use dial_media::layout::IO_MASTERS_FIRST;
use dial_media::transcode;
use dial_media::{
    handler, patch, tape, unit_table, BuildPlan, CanonicalImage, CoreImage, Handler,
    HandlerEncoding, MediaKind, StdFileBackend, UnitSpecSource,
};

use crate::config::Config;
use crate::profile::{profile, SYSTEM_UNITS_PRIMARY, SYSTEM_UNITS_SECONDARY};

fn read_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("read {}", path.display()))
}

fn load_image(path: &Path, kind: MediaKind) -> Result<CanonicalImage> {
    let bytes = read_file(path)?;
    transcode::canonicalize(&bytes, kind)
        .with_context(|| format!("input image '{}' is improperly formatted", path.display()))
}

fn write_image(path: &Path, image: &CanonicalImage, kind: MediaKind) -> Result<()> {
    let mut out = StdFileBackend::create(path)?;
    let len = transcode::materialize(image, kind, &mut out)
        .with_context(|| format!("write {} image {}", kind, path.display()))?;
    info!(path = %path.display(), media = %kind, bytes = len, "wrote image");
    Ok(())
}

fn load_handler(path: &Path, encoding: HandlerEncoding) -> Result<Handler> {
    let bytes = read_file(path)?;
    encoding
        .load(&bytes)
        .with_context(|| format!("read handler image from {}", path.display()))
}

fn load_reference(path: &Path) -> Result<CoreImage> {
    let bytes = read_file(path)?;
    tape::decode_bytes(&bytes)
        .with_context(|| format!("decode reference tape {}", path.display()))
}

fn load_spec(path: &Path) -> Result<UnitSpecSource> {
    let text =
        fs::read_to_string(path).with_context(|| format!("read unit spec {}", path.display()))?;
    let name = path
        .file_name()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| path.display().to_string());
    Ok(UnitSpecSource::parse(name, &text)?)
}

pub struct BuildArgs {
    pub input: PathBuf,
    pub output_stem: PathBuf,
    pub media: MediaKind,
    pub preserve_index: bool,
    pub replace_first: Option<MediaKind>,
    pub second_system: bool,
    pub enable_patches: bool,
    pub reference_tape: Option<PathBuf>,
}

fn with_extension(stem: &Path, kind: MediaKind) -> PathBuf {
    let mut name = stem.as_os_str().to_owned();
    name.push(".");
    name.push(kind.id());
    PathBuf::from(name)
}

/// Full build: a LINCtape image plus, for disk media, an image of the target media.
pub fn build(config: &Config, args: BuildArgs) -> Result<()> {
    let primary_kind = args.replace_first.unwrap_or(MediaKind::Linc);
    let secondary_kind = (args.media != MediaKind::Linc).then_some(args.media);

    let primary = profile(primary_kind);
    let system_spec = if args.second_system {
        SYSTEM_UNITS_SECONDARY
    } else {
        SYSTEM_UNITS_PRIMARY
    };

    let mut spec_paths = vec![
        config.resource(primary.units_primary),
        config.resource(system_spec),
    ];
    if let Some(kind) = secondary_kind {
        spec_paths.push(config.resource(profile(kind).units_secondary));
    }
    let unit_specs = spec_paths
        .iter()
        .map(|p| load_spec(p))
        .collect::<Result<Vec<_>>>()?;

    let primary_handler = load_handler(
        &config.resource(primary.handler_for(args.enable_patches)),
        HandlerEncoding::CoreDump,
    )?;
    let secondary_handler = secondary_kind
        .map(|kind| {
            load_handler(
                &config.resource(profile(kind).handler_for(args.enable_patches)),
                HandlerEncoding::CoreDump,
            )
        })
        .transpose()?;

    let reboot_patch = if args.enable_patches {
        let path = config.reference_tape(args.reference_tape.as_deref());
        Some(load_reference(&path)?)
    } else {
        None
    };

    let plan = BuildPlan {
        preserve_index: args.preserve_index,
        masters: IO_MASTERS_FIRST,
        primary_handler: Some(primary_handler),
        secondary_handler,
        reboot_patch,
        unit_specs: Some(unit_specs),
    };

    let mut image = load_image(&args.input, MediaKind::Linc)?;
    dial_media::compose(&mut image, &plan).context("compose system image")?;

    let tape_path = with_extension(&args.output_stem, MediaKind::Linc);
    write_image(&tape_path, &image, MediaKind::Linc)?;
    if let Some(kind) = secondary_kind {
        write_image(&with_extension(&args.output_stem, kind), &image, kind)?;
    }
    info!(
        primary = %primary_kind,
        secondary = ?secondary_kind.map(|k| k.id()),
        patched = args.enable_patches,
        "build complete"
    );
    Ok(())
}

pub fn copy(
    input: &Path,
    output: &Path,
    from: MediaKind,
    to: MediaKind,
    preserve_index: bool,
) -> Result<()> {
    let bytes = read_file(input)?;
    let mut out = StdFileBackend::create(output)?;
    transcode::copy_media(&bytes, from, to, preserve_index, &mut out).with_context(|| {
        format!(
            "copy {} image {} to {} image {}",
            from,
            input.display(),
            to,
            output.display()
        )
    })?;
    Ok(())
}

pub fn decode_tape(input: &Path, output: &Path, handler_only: bool) -> Result<()> {
    let core = tape::decode_bytes(&read_file(input)?)
        .with_context(|| format!("decode loader tape {}", input.display()))?;
    let bytes = if handler_only {
        Handler::from_core(&core).as_bytes().to_vec()
    } else {
        core.to_bytes()
    };
    fs::write(output, &bytes).with_context(|| format!("write {}", output.display()))?;
    Ok(())
}

/// Runs `edit` on the resident routines of a copy of `input` written to `output`.
fn edit_routines<F>(input: &Path, output: &Path, kind: MediaKind, edit: F) -> Result<()>
where
    F: FnOnce(&mut dial_media::RoutinesStage) -> Result<()>,
{
    let mut image = load_image(input, kind)?;
    let mut routines = image.current_routines();
    edit(&mut routines)?;
    image.commit_routines(&routines)?;
    write_image(output, &image, kind)
}

pub fn write_handlers(
    input: &Path,
    output: &Path,
    kind: MediaKind,
    primary: Option<&Path>,
    secondary: Option<&Path>,
    encoding: HandlerEncoding,
) -> Result<()> {
    if primary.is_none() && secondary.is_none() {
        bail!("nothing to write: pass --primary and/or --secondary");
    }
    let primary = primary.map(|p| load_handler(p, encoding)).transpose()?;
    let secondary = secondary.map(|p| load_handler(p, encoding)).transpose()?;
    edit_routines(input, output, kind, |routines| {
        handler::write_handlers(
            routines.handler_block_mut(),
            primary.as_ref(),
            secondary.as_ref(),
        )
        .context("install handlers")
    })
}

pub fn write_patch(
    config: &Config,
    input: &Path,
    output: &Path,
    kind: MediaKind,
    reference_tape: Option<&Path>,
) -> Result<()> {
    let reference = load_reference(&config.reference_tape(reference_tape))?;
    edit_routines(input, output, kind, |routines| {
        patch::apply(routines.as_mut_bytes(), &reference).context("apply bootstrap patch")
    })
}

pub fn write_table(input: &Path, output: &Path, kind: MediaKind, specs: &[PathBuf]) -> Result<()> {
    let sources = specs
        .iter()
        .map(|p| load_spec(p))
        .collect::<Result<Vec<_>>>()?;
    edit_routines(input, output, kind, |routines| {
        let written = unit_table::rebuild(routines.unit_table_mut(), &sources)
            .context("build unit table")?;
        info!(bytes = written, "unit table rebuilt");
        Ok(())
    })
}
