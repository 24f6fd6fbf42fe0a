mod commands;
mod config;
mod profile;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};

use dial_media::{HandlerEncoding, MediaKind};

use crate::commands::BuildArgs;
use crate::config::{Config, GlobalArgs};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum MediaArg {
    /// LINCtape, 512 blocks with a 6-byte footer.
    Linc,
    /// RK08 disk pack.
    Rk08,
    /// RK05 cartridge (both surfaces).
    Rk05,
    /// Serial disk.
    Sdsk,
}

impl From<MediaArg> for MediaKind {
    fn from(arg: MediaArg) -> Self {
        match arg {
            MediaArg::Linc => MediaKind::Linc,
            MediaArg::Rk08 => MediaKind::Rk08,
            MediaArg::Rk05 => MediaKind::Rk05,
            MediaArg::Sdsk => MediaKind::Sdsk,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EncodingArg {
    /// Binary loader tape.
    Tape,
    /// Flat 8 KiB core dump.
    Core,
}

impl From<EncodingArg> for HandlerEncoding {
    fn from(arg: EncodingArg) -> Self {
        match arg {
            EncodingArg::Tape => HandlerEncoding::Tape,
            EncodingArg::Core => HandlerEncoding::CoreDump,
        }
    }
}

/// Input and output of the single-component writers.
#[derive(Debug, Clone, Args)]
struct EditArgs {
    /// Existing system image.
    input: PathBuf,

    /// Where to write the modified image.
    output: PathBuf,

    /// Media of both input and output.
    #[arg(long, value_enum, default_value = "linc")]
    media: MediaArg,
}

#[derive(Debug, Parser)]
#[command(name = "dial-media")]
#[command(about = "Build and transcode DIAL-MS system media images")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Compose a bootable system from a base LINCtape image.
    Build {
        /// Base system image (LINCtape with footer).
        input: PathBuf,

        /// Output path without extension; `.linc` and `.<media>` are appended.
        output_stem: PathBuf,

        /// Target media. Disk media also get a LINCtape image.
        #[arg(long, value_enum, default_value = "linc")]
        media: MediaArg,

        /// Keep the input's file index and work area instead of erasing them.
        #[arg(long)]
        preserve_index: bool,

        /// Put this device's handler in the primary slot instead of LINCtape.
        #[arg(long, value_enum, value_name = "MEDIA")]
        replace_first: Option<MediaArg>,

        /// Use the system unit spec for a system running from the second unit.
        #[arg(long)]
        second_system: bool,

        /// Use patched handlers and install the reboot bootstrap code.
        #[arg(long)]
        enable_patches: bool,

        /// Loader tape to take the bootstrap code from.
        #[arg(long, value_name = "PATH")]
        reference_tape: Option<PathBuf>,
    },

    /// Re-encode an image for another media, padding or trimming the footer.
    Copy {
        input: PathBuf,
        output: PathBuf,

        #[arg(long, value_enum)]
        from: MediaArg,

        #[arg(long, value_enum)]
        to: MediaArg,

        /// Keep the file index and work area.
        #[arg(long)]
        preserve_index: bool,
    },

    /// Load a binary loader tape into a core image and dump it.
    DecodeTape {
        input: PathBuf,
        output: PathBuf,

        /// Write only the handler window instead of the whole field.
        #[arg(long)]
        handler: bool,
    },

    /// Install device handlers into an existing image.
    WriteHandlers {
        #[command(flatten)]
        edit: EditArgs,

        #[arg(long, value_name = "PATH")]
        primary: Option<PathBuf>,

        #[arg(long, value_name = "PATH")]
        secondary: Option<PathBuf>,

        /// Encoding of the handler files.
        #[arg(long, value_enum, default_value = "core")]
        encoding: EncodingArg,
    },

    /// Copy the reboot bootstrap code into an existing image.
    WritePatch {
        #[command(flatten)]
        edit: EditArgs,

        #[arg(long, value_name = "PATH")]
        reference_tape: Option<PathBuf>,
    },

    /// Rebuild the unit table of an existing image from unit spec files.
    WriteTable {
        #[command(flatten)]
        edit: EditArgs,

        /// Unit spec files, concatenated in order.
        #[arg(long = "spec", value_name = "PATH", required = true)]
        specs: Vec<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_args(&cli.global);
    config.init_logging()?;

    match cli.command {
        Commands::Build {
            input,
            output_stem,
            media,
            preserve_index,
            replace_first,
            second_system,
            enable_patches,
            reference_tape,
        } => commands::build(
            &config,
            BuildArgs {
                input,
                output_stem,
                media: media.into(),
                preserve_index,
                replace_first: replace_first.map(MediaKind::from),
                second_system,
                enable_patches,
                reference_tape,
            },
        ),
        Commands::Copy {
            input,
            output,
            from,
            to,
            preserve_index,
        } => commands::copy(&input, &output, from.into(), to.into(), preserve_index),
        Commands::DecodeTape {
            input,
            output,
            handler,
        } => commands::decode_tape(&input, &output, handler),
        Commands::WriteHandlers {
            edit,
            primary,
            secondary,
            encoding,
        } => commands::write_handlers(
            &edit.input,
            &edit.output,
            edit.media.into(),
            primary.as_deref(),
            secondary.as_deref(),
            encoding.into(),
        ),
        Commands::WritePatch {
            edit,
            reference_tape,
        } => commands::write_patch(
            &config,
            &edit.input,
            &edit.output,
            edit.media.into(),
            reference_tape.as_deref(),
        ),
        Commands::WriteTable { edit, specs } => {
            commands::write_table(&edit.input, &edit.output, edit.media.into(), &specs)
        }
    }
}
