//! Deterministic keyword responder. No I/O, never fails.
//!
//! Also serves as the terminal fallback when another provider errors.

use std::sync::Mutex;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use curamind_core::types::{GenerationRequest, GenerationResult};

use super::GenerationProvider;
use crate::error::GenerationError;

/// Confidence for a keyword-matched canned response.
pub const KEYWORD_CONFIDENCE: f32 = 0.7;
/// Confidence for the generic redirect response.
pub const DEFAULT_CONFIDENCE: f32 = 0.5;

const DEFAULT_RESPONSE: &str = "I understand your health question. For specific medical concerns, \
please consult with a healthcare professional who can provide personalized advice based on your \
individual situation.";

/// Keywords checked in order; the first contained in the message wins.
const HEALTH_PATTERNS: &[(&str, &[&str])] = &[
    (
        "pain",
        &[
            "For pain management, consider rest, ice/heat therapy, and appropriate pain relievers. Consult a healthcare provider if pain persists or worsens.",
            "Pain can have many causes. Try gentle stretching, proper posture, and stress reduction. See a doctor for persistent or severe pain.",
        ],
    ),
    (
        "diet",
        &[
            "A balanced diet with fruits, vegetables, whole grains, and lean proteins supports good health. Stay hydrated and limit processed foods.",
            "Focus on nutrient-dense foods, portion control, and regular meal timing. Consider consulting a registered dietitian for personalized advice.",
        ],
    ),
    (
        "exercise",
        &[
            "Aim for 150 minutes of moderate aerobic activity weekly plus strength training. Start slowly and gradually increase intensity.",
            "Regular physical activity improves cardiovascular health, mood, and energy. Choose activities you enjoy for better adherence.",
        ],
    ),
    (
        "sleep",
        &[
            "Good sleep hygiene includes 7-9 hours nightly, consistent schedule, comfortable environment, and avoiding screens before bed.",
            "Quality sleep is essential for health. Create a relaxing bedtime routine and address any persistent sleep issues with a healthcare provider.",
        ],
    ),
    (
        "stress",
        &[
            "Manage stress through deep breathing, meditation, regular exercise, and social support. Chronic stress can impact physical health.",
            "Stress reduction techniques include mindfulness, time management, and healthy coping strategies. Consider counseling for ongoing stress.",
        ],
    ),
];

/// Answers from a fixed table of health-topic responses.
pub struct OfflineLexicalProvider {
    rng: Mutex<StdRng>,
}

impl std::fmt::Debug for OfflineLexicalProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OfflineLexicalProvider").finish_non_exhaustive()
    }
}

impl Default for OfflineLexicalProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl OfflineLexicalProvider {
    /// Provider whose canned-response choice is seeded from the OS.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    /// Provider with reproducible canned-response choice.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            rng: Mutex::new(rng),
        }
    }

    /// Build a reply for `message` without any I/O.
    pub fn respond(&self, message: &str) -> GenerationResult {
        let lowered = message.to_lowercase();

        for (keyword, responses) in HEALTH_PATTERNS {
            if lowered.contains(keyword) {
                // A poisoned lock still holds a usable RNG.
                let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
                let pick = rng.random_range(0..responses.len());
                tracing::debug!(keyword, pick, "Offline response matched keyword");
                return GenerationResult::new(responses[pick], KEYWORD_CONFIDENCE);
            }
        }

        GenerationResult::new(DEFAULT_RESPONSE, DEFAULT_CONFIDENCE)
    }
}

#[async_trait]
impl GenerationProvider for OfflineLexicalProvider {
    fn name(&self) -> &str {
        "smart"
    }

    fn is_offline(&self) -> bool {
        true
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, GenerationError> {
        Ok(self.respond(&request.user_message))
    }
}
