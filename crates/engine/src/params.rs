// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parameter and resource derivation: auto MPI policy, GPU allocation,
//! pixel-size tracking, and per-stage [`StageBuilder`] construction from a
//! session's config.

use cryoflow_adapters::{
    Class2dBuilder, ClusterParams, CtfBuilder, ExtractBuilder, ImportBuilder, MotionBuilder,
    PickBuilder, StageBuilder,
};
use cryoflow_core::{Class2dVariant, SessionConfig, SlurmConfig, StageKey};
use std::path::PathBuf;

/// The conventional output filename a stage writes, used to form the next
/// stage's chained input path.
pub fn conventional_output_file(stage: StageKey) -> &'static str {
    match stage {
        StageKey::Import => "movies.star",
        StageKey::Motion => "micrographs.star",
        StageKey::Ctf => "micrographs_ctf.star",
        StageKey::Pick => "coords.star",
        StageKey::Extract => "particles.star",
        StageKey::Class2d => "run_classes.mrcs",
    }
}

/// Per-stage MPI default when the operator leaves `slurm_config.mpi` at 1.
fn auto_mpi_default(stage: StageKey) -> u32 {
    match stage {
        StageKey::Import | StageKey::Class2d => 1,
        StageKey::Motion | StageKey::Ctf | StageKey::Pick | StageKey::Extract => 4,
    }
}

/// Resolves the MPI task count for a stage submission: the builder's
/// `supports_mpi` always wins (e.g. the fast Class2D variant forces 1);
/// otherwise an operator override above 1 wins, falling back to the
/// per-stage auto default.
pub fn derive_mpi(stage: StageKey, operator_mpi: u32, builder_supports_mpi: bool) -> u32 {
    if !builder_supports_mpi {
        return 1;
    }
    if operator_mpi > 1 {
        operator_mpi
    } else {
        auto_mpi_default(stage)
    }
}

/// GPU allocation: 0 unless the builder supports GPU, in which case use the
/// operator's configured count or fall back to 1.
pub fn derive_gpu_count(builder_supports_gpu: bool, configured_gpu_count: u32) -> u32 {
    if !builder_supports_gpu {
        0
    } else if configured_gpu_count > 0 {
        configured_gpu_count
    } else {
        1
    }
}

/// Pixel size in angstroms after a stage completes:
/// `import=raw`; `motion/ctf/pick = raw × bin_factor`;
/// `extract/class2d = motion × (box_size / rescaled_size)` when rescaling.
pub fn pixel_size_after_stage(stage: StageKey, config: &SessionConfig) -> f64 {
    let raw = config.optics.pixel_size_angstrom;
    let motion_px = raw * config.motion_config.bin_factor;
    match stage {
        StageKey::Import => raw,
        StageKey::Motion | StageKey::Ctf | StageKey::Pick => motion_px,
        StageKey::Extract | StageKey::Class2d => {
            let extraction = &config.extraction_config;
            if extraction.rescale && extraction.rescaled_size > 0 {
                motion_px * (extraction.box_size as f64 / extraction.rescaled_size as f64)
            } else {
                motion_px
            }
        }
    }
}

/// Builds a [`ClusterParams`] for a stage submission given its builder's
/// capabilities and the session's operator-configured Slurm overrides.
pub fn derive_cluster_params(
    stage: StageKey,
    builder: &dyn StageBuilder,
    slurm: &SlurmConfig,
) -> ClusterParams {
    ClusterParams {
        partition: slurm.partition.clone(),
        mpi: derive_mpi(stage, slurm.mpi, builder.supports_mpi()),
        threads: if slurm.threads > 0 { slurm.threads } else { 1 },
        gpu_count: derive_gpu_count(builder.supports_gpu(), slurm.gpu_count),
    }
}

/// Constructs the [`StageBuilder`] for `stage` given the session config and
/// the files/previous-job context needed for input chaining.
pub fn build_stage_builder(
    stage: StageKey,
    config: &SessionConfig,
    previous_job_name: Option<&str>,
    files: Vec<PathBuf>,
) -> Box<dyn StageBuilder> {
    match stage {
        StageKey::Import => Box::new(ImportBuilder {
            files,
            optics: config.optics,
        }),
        StageKey::Motion => Box::new(MotionBuilder {
            config: config.motion_config,
            previous_job_name: previous_job_name.unwrap_or_default().to_string(),
            input_file: conventional_output_file(StageKey::Import).to_string(),
        }),
        StageKey::Ctf => Box::new(CtfBuilder {
            config: config.ctf_config,
            previous_job_name: previous_job_name.unwrap_or_default().to_string(),
            input_file: conventional_output_file(StageKey::Motion).to_string(),
        }),
        StageKey::Pick => Box::new(PickBuilder {
            config: config.picking_config,
            previous_job_name: previous_job_name.unwrap_or_default().to_string(),
            input_file: conventional_output_file(StageKey::Ctf).to_string(),
        }),
        StageKey::Extract => Box::new(ExtractBuilder {
            config: config.extraction_config,
            previous_job_name: previous_job_name.unwrap_or_default().to_string(),
            input_file: conventional_output_file(StageKey::Pick).to_string(),
        }),
        StageKey::Class2d => Box::new(Class2dBuilder {
            config: config.class2d_config,
            previous_job_name: previous_job_name.unwrap_or_default().to_string(),
            input_file: conventional_output_file(StageKey::Extract).to_string(),
        }),
    }
}

/// Default iteration count is exposed by the config itself
/// ([`cryoflow_core::Class2dConfig::default_iterations`]); re-exported here
/// only to document that Class2D's fast-variant MPI clamp and iteration
/// bump are two faces of the same "fast means cheaper, less distributed" rule.
pub fn class2d_variant(config: &SessionConfig) -> Class2dVariant {
    config.class2d_config.variant
}

#[cfg(test)]
#[path = "params_tests.rs"]
mod tests;
