//! Engine configuration with documented constants
//!
//! All balance numbers are collected here with an explanation of what they
//! drive. None of them are calibrated balance data; they are starting points
//! meant to be overridden from a TOML file.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::error::{EngineError, Result};

/// Configuration for the injury engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // === HIT LOCATION ===
    /// Alignment hit modifier indexed by the number of 45° steps between the
    /// side the attack comes from and the bodypart's alignment.
    ///
    /// Distances past the end of the table use the last entry.
    pub alignment_modifiers: Vec<f64>,

    /// Orientation hit modifier indexed by how many height bands separate the
    /// attack from the bodypart (highest .. lowest).
    pub orientation_modifiers: Vec<f64>,

    // === ARMOUR ===
    /// Fraction of damage removed per degree of an armour layer's base difficulty
    ///
    /// A layer with base difficulty 4 removes 40% of the damage that reaches it
    /// when the attack only just clears its penetration threshold.
    pub reduction_per_degree: f64,

    /// Upper bound on the fraction a single layer may remove
    pub max_layer_reduction: f64,

    // === DAMAGE ===
    /// Litres of blood lost per point of raw damage at bleed modifier 1.0
    pub blood_loss_per_damage: f64,

    /// Shock contributed by each point of wound damage at bleed modifier 1.0
    pub shock_per_damage: f64,

    /// Fraction of a vital part's max life at which death is signalled
    pub vital_lethal_fraction: f64,

    /// Whether a new hit of the same damage type on a part with an open wound
    /// re-injures that wound instead of opening a new one
    pub merge_reinjury: bool,

    // === WOUNDS ===
    /// Damage healed per hour on each wound under the standard strategy
    pub base_healing_per_hour: f64,

    /// Stun shed per hour on each wound
    pub stun_recovery_per_hour: f64,

    /// Weight of each successive wound in the pain/shock/stun aggregate
    ///
    /// At 0.5 the worst wound counts fully, the second half, the third a quarter.
    pub aggregate_falloff: f64,

    /// Litres bled per hour per point of damage on an open external wound
    pub bleed_rate_per_damage_hour: f64,

    /// Litres of blood regenerated per hour while below max volume
    pub blood_regeneration_per_hour: f64,

    /// Healing multiplier for sutured wounds
    pub suture_healing_multiplier: f64,

    /// Healing multiplier for wounds carrying a live infection
    pub infected_healing_multiplier: f64,

    // === INFECTION ===
    /// Onset probability of a fully exposed, maximally sized wound on a part
    /// with infectability 1.0
    pub infection_base_chance: f64,

    /// Scale of the wound-size term `1 - exp(-scale × damage)`
    pub infection_size_scale: f64,

    /// Onset multiplier for wounds that have been cleaned
    pub cleaned_infection_multiplier: f64,

    /// Mean virulence of a new infection at exposure 1.0
    pub base_virulence: f64,

    /// Intensity a new infection starts with
    pub initial_intensity: f64,

    /// Logistic growth rate of intensity per hour at virulence 1.0
    pub infection_growth_per_hour: f64,

    /// Ceiling intensity at virulence 1.0
    pub intensity_ceiling: f64,

    /// Intensity above which the immune response starts building
    pub detection_threshold: f64,

    /// Intensity above which a subclinical infection becomes active
    pub active_threshold: f64,

    /// Immunity gained per hour once the infection is detected
    pub immunity_gain_per_hour: f64,

    /// Intensity cleared per hour per point of immunity
    pub immune_clearance_per_hour: f64,

    /// Largest integration step used when advancing an infection
    pub infection_step_hours: f64,

    /// Intensity at which fever sets in
    pub fever_threshold: f64,

    /// Pain added by a fever
    pub fever_pain: f64,

    /// Intensity at which the infection turns septic
    pub sepsis_threshold: f64,

    /// Stun added by sepsis
    pub sepsis_stun: f64,

    /// Shock added by sepsis
    pub sepsis_shock: f64,

    // === HEALTH ===
    /// Aggregate pain at which a body is critical
    pub critical_pain: f64,

    /// Blood fraction below which a body is critical
    pub critical_blood_fraction: f64,

    /// Fraction of a vital part's max life at which a body is critical
    pub critical_vital_fraction: f64,

    /// Blood fraction below which a body falls unconscious
    pub unconscious_blood_fraction: f64,

    /// Aggregate stun at which a body falls unconscious
    pub unconscious_stun: f64,

    /// Aggregate shock at which a body falls unconscious
    pub unconscious_shock: f64,

    /// Blood fraction at or below which a body dies
    pub lethal_blood_fraction: f64,

    // === BODY ===
    /// Litres of blood per kilogram of body weight
    pub blood_litres_per_kg: f64,

    /// Stamina pool of a fresh body
    pub max_stamina: f64,

    /// Stamina recovered per hour
    pub stamina_recovery_per_hour: f64,

    // === SCHEDULING ===
    /// Minimum body count before ticking bodies in parallel
    pub parallel_threshold: usize,

    /// Seed mixed into every per-body tick RNG
    pub seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            alignment_modifiers: vec![1.0, 0.6, 0.3, 0.15, 0.05],
            orientation_modifiers: vec![1.0, 0.6, 0.25, 0.1, 0.05],

            reduction_per_degree: 0.1,
            max_layer_reduction: 0.9,

            blood_loss_per_damage: 0.01,
            shock_per_damage: 0.5,
            vital_lethal_fraction: 1.0,
            merge_reinjury: true,

            base_healing_per_hour: 1.0,
            stun_recovery_per_hour: 10.0,
            aggregate_falloff: 0.5,
            bleed_rate_per_damage_hour: 0.01,
            blood_regeneration_per_hour: 0.02,
            suture_healing_multiplier: 1.5,
            infected_healing_multiplier: 0.5,

            infection_base_chance: 0.25,
            infection_size_scale: 0.1,
            cleaned_infection_multiplier: 0.2,
            base_virulence: 0.5,
            initial_intensity: 0.01,
            infection_growth_per_hour: 0.3,
            intensity_ceiling: 1.0,
            detection_threshold: 0.05,
            active_threshold: 0.1,
            immunity_gain_per_hour: 0.01,
            immune_clearance_per_hour: 0.05,
            infection_step_hours: 1.0,
            fever_threshold: 0.25,
            fever_pain: 10.0,
            sepsis_threshold: 0.6,
            sepsis_stun: 20.0,
            sepsis_shock: 30.0,

            critical_pain: 60.0,
            critical_blood_fraction: 0.8,
            critical_vital_fraction: 0.5,
            unconscious_blood_fraction: 0.6,
            unconscious_stun: 100.0,
            unconscious_shock: 150.0,
            lethal_blood_fraction: 0.4,

            blood_litres_per_kg: 0.07,
            max_stamina: 100.0,
            stamina_recovery_per_hour: 30.0,

            parallel_threshold: 1000,
            seed: 0x1D5E_A5E5,
        }
    }
}

impl EngineConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate().map_err(EngineError::Config)?;
        Ok(config)
    }

    /// Load and validate a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.alignment_modifiers.is_empty() || self.orientation_modifiers.is_empty() {
            return Err("hit modifier tables must not be empty".into());
        }
        if self
            .alignment_modifiers
            .iter()
            .chain(&self.orientation_modifiers)
            .any(|m| *m < 0.0)
        {
            return Err("hit modifiers must be non-negative".into());
        }

        if !(0.0..1.0).contains(&self.max_layer_reduction) {
            return Err(format!(
                "max_layer_reduction ({}) must be in [0, 1)",
                self.max_layer_reduction
            ));
        }

        // Blood thresholds should be ordered: lethal < unconscious < critical
        if !(self.lethal_blood_fraction < self.unconscious_blood_fraction
            && self.unconscious_blood_fraction < self.critical_blood_fraction)
        {
            return Err(format!(
                "blood fractions must satisfy lethal ({}) < unconscious ({}) < critical ({})",
                self.lethal_blood_fraction,
                self.unconscious_blood_fraction,
                self.critical_blood_fraction
            ));
        }

        if self.critical_vital_fraction > self.vital_lethal_fraction {
            return Err(format!(
                "critical_vital_fraction ({}) should be <= vital_lethal_fraction ({})",
                self.critical_vital_fraction, self.vital_lethal_fraction
            ));
        }

        if self.active_threshold < self.detection_threshold {
            return Err(format!(
                "active_threshold ({}) should be >= detection_threshold ({})",
                self.active_threshold, self.detection_threshold
            ));
        }

        if self.infection_step_hours <= 0.0 {
            return Err("infection_step_hours must be positive".into());
        }

        if self.base_healing_per_hour < 0.0 || self.aggregate_falloff < 0.0 {
            return Err("Rates must be non-negative".into());
        }

        Ok(())
    }
}
