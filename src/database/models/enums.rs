use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid {kind} '{value}'. Allowed values: {allowed}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
    pub allowed: String,
}

/// Closed set of labels stored and serialized as their display text
macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident, $kind:literal { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    _ => Err(UnknownVariant {
                        kind: $kind,
                        value: s.to_string(),
                        allowed: [$($text),+].join(", "),
                    }),
                }
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }

        impl From<$name> for crate::filter::FieldValue {
            fn from(v: $name) -> Self {
                crate::filter::FieldValue::Text(v.as_str().to_string())
            }
        }
    };
}

string_enum!(
    /// Account role; tutors are bound to one center
    Role, "role" {
        Admin => "admin",
        Tutor => "tutor",
    }
);

string_enum!(
    EducationLevel, "education level" {
        Nursery => "Nursery",
        Lkg => "LKG",
        Ukg => "UKG",
        Class1 => "Class 1",
        Class2 => "Class 2",
        Class3 => "Class 3",
        Class4 => "Class 4",
        Class5 => "Class 5",
        Class6 => "Class 6",
        Class7 => "Class 7",
        Class8 => "Class 8",
        Class9 => "Class 9",
        Class10 => "Class 10",
        Class11 => "Class 11",
        Class12 => "Class 12",
    }
);

string_enum!(
    Gender, "gender" {
        Male => "Male",
        Female => "Female",
        Other => "Other",
    }
);

string_enum!(
    Skill, "skill" {
        Tailoring => "Tailoring",
        Cooking => "Cooking",
        Handicrafts => "Handicrafts",
        ComputerSkills => "Computer Skills",
        BeautyWellness => "Beauty & Wellness",
        Embroidery => "Embroidery",
        Knitting => "Knitting",
        JewelryMaking => "Jewelry Making",
        Painting => "Painting",
        Other => "Other",
    }
);

string_enum!(
    TrainingStatus, "training status" {
        NotStarted => "Not Started",
        Started => "Started",
        InProgress => "In Progress",
        Completed => "Completed",
        Discontinued => "Discontinued",
    }
);

string_enum!(
    JobStatus, "job status" {
        Unemployed => "Unemployed",
        SelfEmployed => "Self Employed",
        Employed => "Employed",
        SeekingEmployment => "Seeking Employment",
    }
);

impl JobStatus {
    /// Counts toward the employment rate
    pub fn is_employed(&self) -> bool {
        matches!(self, JobStatus::SelfEmployed | JobStatus::Employed)
    }
}

string_enum!(
    AttendanceStatus, "attendance status" {
        Present => "Present",
        Absent => "Absent",
    }
);

string_enum!(
    Subject, "subject" {
        Mathematics => "Mathematics",
        English => "English",
        Science => "Science",
        SocialStudies => "Social Studies",
        Hindi => "Hindi",
        Computer => "Computer",
        Art => "Art",
        PhysicalEducation => "Physical Education",
    }
);

string_enum!(
    TestType, "test type" {
        Quiz => "Quiz",
        UnitTest => "Unit Test",
        MidTerm => "Mid Term",
        FinalExam => "Final Exam",
        Assignment => "Assignment",
        Project => "Project",
    }
);

/// Decode a text column into one of the label enums
pub(crate) fn decode_label<T>(raw: String, column: &str) -> Result<T, sqlx::Error>
where
    T: std::str::FromStr<Err = UnknownVariant>,
{
    raw.parse::<T>().map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_round_trip_through_text() {
        for level in EducationLevel::ALL {
            assert_eq!(level.as_str().parse::<EducationLevel>().unwrap(), *level);
        }
        assert_eq!(EducationLevel::ALL.len(), 15);
        assert_eq!(Subject::ALL.len(), 8);
        assert_eq!(TestType::ALL.len(), 6);
    }

    #[test]
    fn test_unknown_label_lists_allowed_values() {
        let err = "Class 13".parse::<EducationLevel>().unwrap_err();
        assert_eq!(err.kind, "education level");
        assert!(err.to_string().contains("Class 12"));
    }

    #[test]
    fn test_serde_uses_display_text() {
        let json = serde_json::to_string(&Skill::BeautyWellness).unwrap();
        assert_eq!(json, "\"Beauty & Wellness\"");
        let parsed: JobStatus = serde_json::from_str("\"Self Employed\"").unwrap();
        assert!(parsed.is_employed());
        assert!(serde_json::from_str::<Role>("\"guest\"").is_err());
    }

    #[test]
    fn test_education_levels_order_by_grade() {
        assert!(EducationLevel::Ukg < EducationLevel::Class1);
        assert!(EducationLevel::Class2 < EducationLevel::Class10);
    }
}
