//! End-to-end composition of a system image.

use tracing::info;

use crate::handler::{self, Handler};
use crate::layout::{Region, IO_MASTERS_FIRST};
use crate::media::MediaKind;
use crate::tape::CoreImage;
use crate::transcode;
use crate::unit_table::{self, UnitSpecSource};
use crate::{CanonicalImage, Result};

/// Everything a build needs, already loaded.
#[derive(Clone, Debug)]
pub struct BuildPlan {
    /// Keep the file index and work area instead of zeroing them.
    pub preserve_index: bool,
    /// Handler masters block the resident routines are rebuilt from.
    pub masters: Region,
    pub primary_handler: Option<Handler>,
    pub secondary_handler: Option<Handler>,
    /// Reference build to take the reboot bootstrap patch from. `None` leaves BOOTER alone.
    pub reboot_patch: Option<CoreImage>,
    /// Unit spec sources in table order. `None` leaves the unit table alone.
    pub unit_specs: Option<Vec<UnitSpecSource>>,
}

impl Default for BuildPlan {
    fn default() -> Self {
        Self {
            preserve_index: false,
            masters: IO_MASTERS_FIRST,
            primary_handler: None,
            secondary_handler: None,
            reboot_patch: None,
            unit_specs: None,
        }
    }
}

/// Applies `plan` to `image` in place.
///
/// Order is fixed: erase, stage fresh routines from the masters, install handlers, apply the
/// bootstrap patch, rebuild the unit table, write the routines back.
pub fn compose(image: &mut CanonicalImage, plan: &BuildPlan) -> Result<()> {
    if !plan.preserve_index {
        image.erase_index_and_work_area();
    }

    let mut routines = image.stage_routines(plan.masters);

    handler::write_handlers(
        routines.handler_block_mut(),
        plan.primary_handler.as_ref(),
        plan.secondary_handler.as_ref(),
    )?;

    if let Some(reference) = &plan.reboot_patch {
        crate::patch::apply(routines.as_mut_bytes(), reference)?;
    }

    if let Some(sources) = &plan.unit_specs {
        unit_table::rebuild(routines.unit_table_mut(), sources)?;
    }

    image.commit_routines(&routines)?;
    info!(
        blocks = image.block_count(),
        patched = plan.reboot_patch.is_some(),
        "composed system image"
    );
    Ok(())
}

/// Canonicalizes `input` and composes it according to `plan`.
pub fn build_system_image(
    input: &[u8],
    input_kind: MediaKind,
    plan: &BuildPlan,
) -> Result<CanonicalImage> {
    let mut image = transcode::canonicalize(input, input_kind)?;
    compose(&mut image, plan)?;
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{read_handler, HandlerSlot, HANDLER_LEN};
    use crate::layout::{blocks_to_bytes, BYTES_PER_BLOCK, IO_ROUTINES};

    fn image_with_masters() -> CanonicalImage {
        let mut bytes = vec![0x33u8; blocks_to_bytes(512)];
        bytes[blocks_to_bytes(0o345)..blocks_to_bytes(0o346)].fill(0x45);
        bytes[blocks_to_bytes(0o365)..blocks_to_bytes(0o366)].fill(0x65);
        CanonicalImage::from_blocks(bytes).unwrap()
    }

    #[test]
    fn empty_plan_refreshes_routines_from_masters() {
        let mut image = image_with_masters();
        compose(
            &mut image,
            &BuildPlan {
                preserve_index: true,
                ..BuildPlan::default()
            },
        )
        .unwrap();

        let routines = image.region(IO_ROUTINES);
        assert!(routines[..BYTES_PER_BLOCK].iter().all(|b| *b == 0x45));
        assert!(routines[BYTES_PER_BLOCK..].iter().all(|b| *b == 0x65));
        assert_eq!(image.as_bytes()[0], 0x33);
    }

    #[test]
    fn handlers_and_table_land_in_routines() {
        let mut image = image_with_masters();
        let primary = Handler::try_from(&[0xA1u8; HANDLER_LEN][..]).unwrap();
        let plan = BuildPlan {
            primary_handler: Some(primary.clone()),
            unit_specs: Some(vec![UnitSpecSource::parse("pri", "1,2,3\n").unwrap()]),
            ..BuildPlan::default()
        };
        compose(&mut image, &plan).unwrap();

        let routines = image.current_routines();
        assert_eq!(
            read_handler(routines.handler_block(), HandlerSlot::Primary).unwrap(),
            primary
        );
        assert_eq!(&routines.unit_table()[..8], &[1, 0, 2, 0, 3, 0, 0xFF, 0x0F]);
        assert!(image.as_bytes()[..blocks_to_bytes(0o300)]
            .iter()
            .all(|b| *b == 0));
    }

    #[test]
    fn failing_step_leaves_routines_untouched() {
        let mut image = image_with_masters();
        let before = image.current_routines();
        let rows = (0..30).map(|_| "1,1,1").collect::<Vec<_>>().join("\n");
        let plan = BuildPlan {
            preserve_index: true,
            unit_specs: Some(vec![UnitSpecSource::parse("pri", &rows).unwrap()]),
            ..BuildPlan::default()
        };
        assert!(compose(&mut image, &plan).is_err());
        assert_eq!(image.current_routines(), before);
    }
}
