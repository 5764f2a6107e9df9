mod ids;
mod mistake;
mod progress;
mod question;
mod view;

pub use ids::{ParseIdError, QuestionId};
pub use mistake::MistakeEntry;
pub use progress::{ProgressRecord, ProgressStatus};
pub use question::{Question, QuestionCorrection, QuestionKind};
pub use view::{GridItem, QuestionView, Stats, SubmitResult};
