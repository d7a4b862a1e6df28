//! Confetti bursts and the continuous-confetti loop

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::config::EffectConfig;
use crate::platform::{Surface, TimerHandle};

/// Fallback when the palette is configured empty
const DEFAULT_COLOR: &str = "#667eea";

/// One falling piece of confetti
#[derive(Debug, Clone, PartialEq)]
pub struct ConfettiParticle {
    /// Position within the burst
    pub index: usize,
    /// Delay before the particle appears (ms)
    pub spawn_delay_ms: u32,
    /// Horizontal position (0 - 100 % of viewport width)
    pub left_percent: f32,
    /// CSS colour
    pub color: String,
    /// CSS animation delay (s)
    pub animation_delay: f32,
    /// Time on screen before removal (ms)
    pub lifetime_ms: u32,
}

/// Lays out bursts with a seeded RNG
#[derive(Debug, Clone)]
pub struct ConfettiCannon {
    rng: Pcg32,
    config: EffectConfig,
}

impl ConfettiCannon {
    pub fn new(seed: u64, config: EffectConfig) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            config,
        }
    }

    /// Particles for one burst, staggered by index
    pub fn burst(&mut self) -> Vec<ConfettiParticle> {
        let palette = &self.config.confetti_palette;
        (0..self.config.confetti_count)
            .map(|index| {
                let color = if palette.is_empty() {
                    DEFAULT_COLOR.to_string()
                } else {
                    palette[self.rng.random_range(0..palette.len())].clone()
                };
                ConfettiParticle {
                    index,
                    spawn_delay_ms: index as u32 * self.config.confetti_stagger_ms,
                    left_percent: self.rng.random::<f32>() * 100.0,
                    color,
                    animation_delay: self.rng.random::<f32>()
                        * self.config.confetti_max_animation_delay,
                    lifetime_ms: self.config.confetti_lifetime_ms,
                }
            })
            .collect()
    }

    /// Lay out a burst and hand it to the surface
    pub fn fire(&mut self, surface: &dyn Surface) -> usize {
        let particles = self.burst();
        for particle in &particles {
            surface.spawn_confetti(particle);
        }
        log::info!("Confetti effect triggered!");
        particles.len()
    }
}

/// Continuous confetti state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfettiLoop {
    #[default]
    Stopped,
    Running(TimerHandle),
}

impl ConfettiLoop {
    pub fn is_running(&self) -> bool {
        matches!(self, ConfettiLoop::Running(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_layout() {
        let mut cannon = ConfettiCannon::new(7, EffectConfig::default());
        let burst = cannon.burst();
        assert_eq!(burst.len(), 50);
        assert_eq!(burst[0].spawn_delay_ms, 0);
        assert_eq!(burst[49].spawn_delay_ms, 1470);
        for p in &burst {
            assert!((0.0..100.0).contains(&p.left_percent));
            assert!((0.0..0.5).contains(&p.animation_delay));
            assert_eq!(p.lifetime_ms, 3000);
            assert!(EffectConfig::default().confetti_palette.contains(&p.color));
        }
    }

    #[test]
    fn test_same_seed_same_burst() {
        let mut a = ConfettiCannon::new(42, EffectConfig::default());
        let mut b = ConfettiCannon::new(42, EffectConfig::default());
        assert_eq!(a.burst(), b.burst());
    }

    #[test]
    fn test_empty_palette_uses_fallback() {
        let config = EffectConfig {
            confetti_palette: Vec::new(),
            confetti_count: 3,
            ..Default::default()
        };
        let mut cannon = ConfettiCannon::new(1, config);
        assert!(cannon.burst().iter().all(|p| p.color == DEFAULT_COLOR));
    }
}
