/*!
 * Quality estimation for back-translations.
 *
 * - **bleu**: BLEU score of the round trip against the original
 * - **assessment**: Confidence bands, star ratings and recommendations
 */

pub mod assessment;
pub mod bleu;

pub use assessment::{ConfidenceLevel, QualityAssessment};
pub use bleu::BleuScorer;
