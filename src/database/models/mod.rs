pub mod enums;
pub mod user;
pub mod family;
pub mod student;
pub mod woman;
pub mod attendance;
pub mod test_score;

pub use enums::{AttendanceStatus, EducationLevel, Gender, JobStatus, Role, Skill, Subject, TestType, TrainingStatus, UnknownVariant};
pub use user::{User, UserRef};
pub use family::{Family, FamilyRef, FamilyView};
pub use student::{Student, StudentRef, StudentView};
pub use woman::{Woman, WomanView};
pub use attendance::{Attendance, AttendanceView};
pub use test_score::{TestScore, TestScoreView};
