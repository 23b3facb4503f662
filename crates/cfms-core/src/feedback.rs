//! Per-section feedback threads and the rejection banner.
//!
//! Each review stage owns one map from [`SectionKey`] to free text on the
//! folder. Writes overwrite the previous text for that section (last write
//! wins); nothing in the system deletes an entry.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entities::CourseFolder;
use crate::enums::{FolderStatus, Role};
use crate::errors::CoreError;

// ---------------------------------------------------------------------------
// SectionKey
// ---------------------------------------------------------------------------

/// Fixed folder sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Section {
    TitlePage,
    CourseOutline,
    CourseLog,
    Attendance,
    LectureNotes,
    Assignments,
    Quizzes,
    Midterm,
    Final,
    CourseResult,
    ProjectReport,
    CloAssessment,
    CourseReviewReport,
    FolderReviewReport,
}

impl Section {
    pub const ALL: [Self; 14] = [
        Self::TitlePage,
        Self::CourseOutline,
        Self::CourseLog,
        Self::Attendance,
        Self::LectureNotes,
        Self::Assignments,
        Self::Quizzes,
        Self::Midterm,
        Self::Final,
        Self::CourseResult,
        Self::ProjectReport,
        Self::CloAssessment,
        Self::CourseReviewReport,
        Self::FolderReviewReport,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TitlePage => "TITLE_PAGE",
            Self::CourseOutline => "COURSE_OUTLINE",
            Self::CourseLog => "COURSE_LOG",
            Self::Attendance => "ATTENDANCE",
            Self::LectureNotes => "LECTURE_NOTES",
            Self::Assignments => "ASSIGNMENTS",
            Self::Quizzes => "QUIZZES",
            Self::Midterm => "MIDTERM",
            Self::Final => "FINAL",
            Self::CourseResult => "COURSE_RESULT",
            Self::ProjectReport => "PROJECT_REPORT",
            Self::CloAssessment => "CLO_ASSESSMENT",
            Self::CourseReviewReport => "COURSE_REVIEW_REPORT",
            Self::FolderReviewReport => "FOLDER_REVIEW_REPORT",
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        let canonical = match token {
            "TITLE" => "TITLE_PAGE",
            "OUTLINE" => "COURSE_OUTLINE",
            "LOG" => "COURSE_LOG",
            "RESULT" => "COURSE_RESULT",
            "PROJECT" => "PROJECT_REPORT",
            "CLO" => "CLO_ASSESSMENT",
            other => other,
        };
        Self::ALL.into_iter().find(|s| s.as_str() == canonical)
    }
}

/// Sections that repeat per assignment or quiz instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InstanceKind {
    Assignment,
    Quiz,
}

impl InstanceKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Assignment => "ASSIGNMENT",
            Self::Quiz => "QUIZ",
        }
    }
}

/// Key identifying the folder section a feedback entry is attached to.
///
/// Parsed from strings such as `COURSE_OUTLINE`, `outline` or
/// `ASSIGNMENT_12_QUESTION_PAPER`. Input is trimmed and upper-cased and
/// short aliases are expanded before matching.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SectionKey {
    Fixed(Section),
    Instance {
        kind: InstanceKind,
        id: String,
        part: Option<String>,
    },
}

impl SectionKey {
    /// Normalize and parse a raw section key.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` for empty or unrecognized keys.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let token = raw.trim().to_ascii_uppercase();
        if token.is_empty() {
            return Err(CoreError::Validation("section key is empty".into()));
        }
        if let Some(section) = Section::from_token(&token) {
            return Ok(Self::Fixed(section));
        }
        for kind in [InstanceKind::Assignment, InstanceKind::Quiz] {
            let Some(rest) = token
                .strip_prefix(kind.as_str())
                .and_then(|r| r.strip_prefix('_'))
            else {
                continue;
            };
            let (id, part) = match rest.split_once('_') {
                Some((id, part)) => (id, Some(part)),
                None => (rest, None),
            };
            if id.is_empty() || part.is_some_and(str::is_empty) {
                break;
            }
            return Ok(Self::Instance {
                kind,
                id: id.to_string(),
                part: part.map(str::to_string),
            });
        }
        Err(CoreError::Validation(format!("unknown section key: {raw}")))
    }
}

impl fmt::Display for SectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(section) => f.write_str(section.as_str()),
            Self::Instance { kind, id, part } => {
                write!(f, "{}_{id}", kind.as_str())?;
                if let Some(part) = part {
                    write!(f, "_{part}")?;
                }
                Ok(())
            }
        }
    }
}

impl TryFrom<String> for SectionKey {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SectionKey> for String {
    fn from(key: SectionKey) -> Self {
        key.to_string()
    }
}

/// Per-section reviewer remarks for one stage.
pub type FeedbackMap = BTreeMap<SectionKey, String>;

// ---------------------------------------------------------------------------
// Recording
// ---------------------------------------------------------------------------

/// The stage whose feedback map an entry is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackStage {
    Coordinator,
    AuditMember,
}

impl FeedbackStage {
    /// The role that authors this stage's entries.
    #[must_use]
    pub const fn author_role(self) -> Role {
        match self {
            Self::Coordinator => Role::Coordinator,
            Self::AuditMember => Role::AuditMember,
        }
    }

    /// Statuses in which this stage currently or previously held review.
    #[must_use]
    pub const fn accepts_writes_in(self, status: FolderStatus) -> bool {
        match self {
            Self::Coordinator => matches!(
                status,
                FolderStatus::Submitted
                    | FolderStatus::ApprovedCoordinator
                    | FolderStatus::RejectedCoordinator
            ),
            Self::AuditMember => matches!(
                status,
                FolderStatus::UnderAudit
                    | FolderStatus::AuditCompleted
                    | FolderStatus::SubmittedToHod
            ),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Coordinator => "coordinator",
            Self::AuditMember => "audit_member",
        }
    }
}

impl fmt::Display for FeedbackStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Write one feedback entry, overwriting any previous text for the section.
///
/// # Errors
///
/// - `PermissionDenied` if `author` is not the stage's role or the stage
///   does not hold review in the folder's current status.
/// - `Validation` if `text` is blank.
pub fn record_feedback(
    folder: &mut CourseFolder,
    key: SectionKey,
    stage: FeedbackStage,
    author: Role,
    text: &str,
) -> Result<(), CoreError> {
    if author != stage.author_role() {
        return Err(CoreError::denied(format!(
            "{author} cannot write {stage} feedback"
        )));
    }
    if !stage.accepts_writes_in(folder.status) {
        return Err(CoreError::denied(format!(
            "{stage} feedback is closed while the folder is {}",
            folder.status
        )));
    }
    let text = text.trim();
    if text.is_empty() {
        return Err(CoreError::Validation("feedback text is empty".into()));
    }
    let map = match stage {
        FeedbackStage::Coordinator => &mut folder.coordinator_feedback,
        FeedbackStage::AuditMember => &mut folder.audit_member_feedback,
    };
    map.insert(key, text.to_string());
    Ok(())
}

// ---------------------------------------------------------------------------
// Visibility
// ---------------------------------------------------------------------------

/// Feedback a viewer may read. `None` means the stage is hidden.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibleFeedback {
    pub coordinator: Option<FeedbackMap>,
    pub audit_member: Option<FeedbackMap>,
}

/// Select the feedback maps `viewer` may read on `folder`.
///
/// Faculty see every stage once the folder is in a reviewable status or a
/// rejected one (rejections must show why). Reviewers see their own stage
/// plus earlier stages as context.
#[must_use]
pub fn visible_feedback(folder: &CourseFolder, viewer: Role) -> VisibleFeedback {
    let both = || VisibleFeedback {
        coordinator: Some(folder.coordinator_feedback.clone()),
        audit_member: Some(folder.audit_member_feedback.clone()),
    };
    match viewer {
        Role::Faculty => {
            if folder.status.is_reviewable() || folder.status.is_rejected() {
                both()
            } else {
                VisibleFeedback::default()
            }
        }
        Role::Coordinator => VisibleFeedback {
            coordinator: Some(folder.coordinator_feedback.clone()),
            audit_member: None,
        },
        Role::AuditMember | Role::Convener | Role::Hod | Role::Admin => both(),
    }
}

/// A copy of `folder` with every feedback map `viewer` may not read emptied.
#[must_use]
pub fn redact_feedback(folder: &CourseFolder, viewer: Role) -> CourseFolder {
    let visible = visible_feedback(folder, viewer);
    let mut redacted = folder.clone();
    redacted.coordinator_feedback = visible.coordinator.unwrap_or_default();
    redacted.audit_member_feedback = visible.audit_member.unwrap_or_default();
    redacted
}

// ---------------------------------------------------------------------------
// Rejection banner
// ---------------------------------------------------------------------------

/// The stage that rejected a folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectingStage {
    Coordinator,
    Convener,
    Hod,
}

/// One non-empty section remark shown under the banner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionRemark {
    pub stage: FeedbackStage,
    pub section: SectionKey,
    pub text: String,
}

/// "Who rejected and why" for a folder in a `REJECTED_*` status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectionBanner {
    pub stage: RejectingStage,
    pub status: FolderStatus,
    pub overall: Option<String>,
    pub sections: Vec<SectionRemark>,
}

fn first_non_empty<'a>(candidates: impl IntoIterator<Item = Option<&'a String>>) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .map(|s| s.trim())
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// Build the banner for a rejected folder, or `None` when it is not rejected.
#[must_use]
pub fn rejection_banner(folder: &CourseFolder) -> Option<RejectionBanner> {
    let (stage, overall) = match folder.status {
        FolderStatus::RejectedCoordinator => (
            RejectingStage::Coordinator,
            first_non_empty([
                folder.coordinator_remarks.as_ref(),
                folder.coordinator_notes.as_ref(),
            ]),
        ),
        FolderStatus::RejectedByConvener => (
            RejectingStage::Convener,
            first_non_empty([folder.convener_notes.as_ref()]),
        ),
        FolderStatus::RejectedByHod => (
            RejectingStage::Hod,
            first_non_empty([
                folder.hod_notes.as_ref(),
                folder.hod_final_feedback.as_ref(),
            ]),
        ),
        _ => return None,
    };

    let sections = [
        (FeedbackStage::Coordinator, &folder.coordinator_feedback),
        (FeedbackStage::AuditMember, &folder.audit_member_feedback),
    ]
    .into_iter()
    .flat_map(|(stage, map)| {
        map.iter()
            .filter(|(_, text)| !text.trim().is_empty())
            .map(move |(section, text)| SectionRemark {
                stage,
                section: section.clone(),
                text: text.clone(),
            })
    })
    .collect();

    Some(RejectionBanner {
        stage,
        status: folder.status,
        overall,
        sections,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::test_support::draft_folder;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("COURSE_OUTLINE", "COURSE_OUTLINE")]
    #[case("  outline ", "COURSE_OUTLINE")]
    #[case("title", "TITLE_PAGE")]
    #[case("Log", "COURSE_LOG")]
    #[case("clo", "CLO_ASSESSMENT")]
    #[case("assignment_12_question_paper", "ASSIGNMENT_12_QUESTION_PAPER")]
    #[case("QUIZ_3", "QUIZ_3")]
    fn section_keys_normalize(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(SectionKey::parse(raw).unwrap().to_string(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("SYLLABUS")]
    #[case("ASSIGNMENT_")]
    #[case("QUIZ_4_")]
    fn bad_section_keys(#[case] raw: &str) {
        assert!(matches!(
            SectionKey::parse(raw),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn assignment_key_splits_id_and_part() {
        let key = SectionKey::parse("ASSIGNMENT_7_SOLUTION").unwrap();
        assert_eq!(
            key,
            SectionKey::Instance {
                kind: InstanceKind::Assignment,
                id: "7".into(),
                part: Some("SOLUTION".into()),
            }
        );
    }

    #[test]
    fn feedback_map_serializes_with_string_keys() {
        let mut map = FeedbackMap::new();
        map.insert(SectionKey::parse("outline").unwrap(), "fix CLOs".into());
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"COURSE_OUTLINE":"fix CLOs"}"#);
        let back: FeedbackMap = serde_json::from_str(r#"{"outline":"fix CLOs"}"#).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn last_write_wins() {
        let mut folder = draft_folder();
        folder.status = FolderStatus::Submitted;
        let key = SectionKey::Fixed(Section::Attendance);
        record_feedback(&mut folder, key.clone(), FeedbackStage::Coordinator, Role::Coordinator, "first")
            .unwrap();
        record_feedback(&mut folder, key.clone(), FeedbackStage::Coordinator, Role::Coordinator, " second ")
            .unwrap();
        assert_eq!(folder.coordinator_feedback.get(&key).map(String::as_str), Some("second"));
        assert_eq!(folder.coordinator_feedback.len(), 1);
    }

    #[test]
    fn wrong_author_is_denied() {
        let mut folder = draft_folder();
        folder.status = FolderStatus::UnderAudit;
        let err = record_feedback(
            &mut folder,
            SectionKey::Fixed(Section::Final),
            FeedbackStage::AuditMember,
            Role::Coordinator,
            "nope",
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::PermissionDenied { .. }));
        assert!(folder.audit_member_feedback.is_empty());
    }

    #[test]
    fn coordinator_feedback_closed_during_audit() {
        let mut folder = draft_folder();
        folder.status = FolderStatus::UnderAudit;
        let err = record_feedback(
            &mut folder,
            SectionKey::Fixed(Section::Final),
            FeedbackStage::Coordinator,
            Role::Coordinator,
            "late",
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::PermissionDenied { .. }));
    }

    #[test]
    fn blank_feedback_rejected() {
        let mut folder = draft_folder();
        folder.status = FolderStatus::Submitted;
        let err = record_feedback(
            &mut folder,
            SectionKey::Fixed(Section::Final),
            FeedbackStage::Coordinator,
            Role::Coordinator,
            "  ",
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn faculty_sees_nothing_in_draft() {
        let mut folder = draft_folder();
        folder
            .coordinator_feedback
            .insert(SectionKey::Fixed(Section::Midterm), "x".into());
        assert_eq!(visible_feedback(&folder, Role::Faculty), VisibleFeedback::default());
        folder.status = FolderStatus::RejectedCoordinator;
        assert!(visible_feedback(&folder, Role::Faculty).coordinator.is_some());
    }

    #[test]
    fn coordinator_sees_only_own_stage() {
        let mut folder = draft_folder();
        folder.status = FolderStatus::AuditCompleted;
        let visible = visible_feedback(&folder, Role::Coordinator);
        assert!(visible.coordinator.is_some());
        assert!(visible.audit_member.is_none());
        let visible = visible_feedback(&folder, Role::AuditMember);
        assert!(visible.coordinator.is_some());
        assert!(visible.audit_member.is_some());
    }

    #[test]
    fn coordinator_banner_prefers_remarks_over_notes() {
        let mut folder = draft_folder();
        folder.status = FolderStatus::RejectedCoordinator;
        folder.coordinator_notes = Some("notes".into());
        folder.coordinator_remarks = Some("   ".into());
        let banner = rejection_banner(&folder).unwrap();
        assert_eq!(banner.overall.as_deref(), Some("notes"));

        folder.coordinator_remarks = Some("remarks".into());
        let banner = rejection_banner(&folder).unwrap();
        assert_eq!(banner.stage, RejectingStage::Coordinator);
        assert_eq!(banner.overall.as_deref(), Some("remarks"));
    }

    #[test]
    fn hod_banner_falls_back_to_final_feedback_and_lists_sections() {
        let mut folder = draft_folder();
        folder.status = FolderStatus::RejectedByHod;
        folder.hod_final_feedback = Some("redo the log".into());
        folder
            .coordinator_feedback
            .insert(SectionKey::Fixed(Section::CourseLog), "missing weeks".into());
        folder
            .audit_member_feedback
            .insert(SectionKey::Fixed(Section::Final), String::new());
        let banner = rejection_banner(&folder).unwrap();
        assert_eq!(banner.overall.as_deref(), Some("redo the log"));
        assert_eq!(
            banner.sections,
            vec![SectionRemark {
                stage: FeedbackStage::Coordinator,
                section: SectionKey::Fixed(Section::CourseLog),
                text: "missing weeks".into(),
            }]
        );
    }

    #[test]
    fn no_banner_unless_rejected() {
        let mut folder = draft_folder();
        folder.status = FolderStatus::ApprovedByHod;
        assert!(rejection_banner(&folder).is_none());
    }

    #[test]
    fn redaction_empties_hidden_stages() {
        let mut folder = draft_folder();
        folder.status = FolderStatus::Submitted;
        folder
            .coordinator_feedback
            .insert(SectionKey::Fixed(Section::Final), "fine".into());
        folder
            .audit_member_feedback
            .insert(SectionKey::Fixed(Section::CourseOutline), "numbering".into());

        let coordinator = redact_feedback(&folder, Role::Coordinator);
        assert!(coordinator.audit_member_feedback.is_empty());
        assert_eq!(coordinator.coordinator_feedback.len(), 1);
        assert_eq!(redact_feedback(&folder, Role::Hod), folder);

        folder.status = FolderStatus::Draft;
        let owner = redact_feedback(&folder, Role::Faculty);
        assert!(owner.coordinator_feedback.is_empty() && owner.audit_member_feedback.is_empty());
    }
}
