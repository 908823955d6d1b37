//! Content reports and the pending-upload approval queue.
//!
//! Both are small state machines. Reports move `pending → reviewed →
//! resolved` (a pending report may also be resolved directly). Uploads move
//! `pending → approved` or `pending → rejected` and stay there. Any other
//! transition is rejected as [`MurmurError::Invalid`] without touching state.

use super::audio_store::validate_track;
use super::backend::StorageBackend;
use super::AudioStore;
use crate::error::{MurmurError, Result};
use crate::model::{
    ContentReport, NotificationKind, PendingUpload, ReportStatus, ReportTarget, UploadStatus,
};
use chrono::Utc;
use serde_json::json;
use tracing::debug;

impl<B: StorageBackend> AudioStore<B> {
    // --- Reports ---

    /// Files a report. The reported track, comment or user must exist.
    pub fn file_report(&mut self, mut report: ContentReport) -> Result<()> {
        if report.id.trim().is_empty() || report.reporter_id.trim().is_empty() {
            return Err(MurmurError::invalid(
                "report: id and reporterId must not be empty",
            ));
        }
        let target_known = match report.target {
            ReportTarget::Track => self.state.tracks.contains(&report.target_id),
            ReportTarget::Comment => self.state.comments.contains(&report.target_id),
            ReportTarget::User => self.is_known_user(&report.target_id),
        };
        if !target_known {
            let kind = match report.target {
                ReportTarget::Track => "track",
                ReportTarget::Comment => "comment",
                ReportTarget::User => "user",
            };
            return Err(MurmurError::not_found(kind, report.target_id));
        }

        report.status = ReportStatus::Pending;
        report.reviewed_at = None;
        report.reviewed_by = None;
        let id = report.id.clone();
        self.state.reports.insert(report)?;
        self.write_through();
        debug!(report_id = %id, "filed report");
        Ok(())
    }

    pub fn get_report_by_id(&self, id: &str) -> Result<&ContentReport> {
        self.state.reports.require(id)
    }

    /// `pending → reviewed`.
    pub fn review_report(&mut self, id: &str, moderator_id: &str) -> Result<()> {
        self.transition_report(id, moderator_id, ReportStatus::Reviewed)
    }

    /// `pending | reviewed → resolved`.
    pub fn resolve_report(&mut self, id: &str, moderator_id: &str) -> Result<()> {
        self.transition_report(id, moderator_id, ReportStatus::Resolved)
    }

    /// Reports in `status`, in filing order.
    pub fn reports_with_status(&self, status: ReportStatus) -> Vec<&ContentReport> {
        self.state
            .reports
            .iter()
            .filter(|r| r.status == status)
            .collect()
    }

    fn transition_report(&mut self, id: &str, moderator_id: &str, to: ReportStatus) -> Result<()> {
        if moderator_id.trim().is_empty() {
            return Err(MurmurError::invalid("moderator id: must not be empty"));
        }
        let report = self.state.reports.require_mut(id)?;
        let legal = matches!(
            (report.status, to),
            (ReportStatus::Pending, ReportStatus::Reviewed)
                | (ReportStatus::Pending, ReportStatus::Resolved)
                | (ReportStatus::Reviewed, ReportStatus::Resolved)
        );
        if !legal {
            return Err(MurmurError::invalid(format!(
                "report {}: cannot move from {:?} to {:?}",
                id, report.status, to
            )));
        }

        report.status = to;
        report.reviewed_at = Some(Utc::now());
        report.reviewed_by = Some(moderator_id.to_string());
        self.write_through();
        debug!(report_id = %id, status = ?to, "report transitioned");
        Ok(())
    }

    // --- Pending uploads ---

    /// Queues a candidate track for approval. The track is validated the
    /// same way [`AudioStore::add_track`] would, but not published.
    pub fn submit_upload(&mut self, mut upload: PendingUpload) -> Result<()> {
        if upload.id.trim().is_empty() {
            return Err(MurmurError::invalid("upload id: must not be empty"));
        }
        if upload.track.owner_id.is_empty() {
            upload.track.owner_id = upload.track.owner.id.clone();
        }
        validate_track(&upload.track)?;

        upload.status = UploadStatus::Pending;
        upload.decided_at = None;
        upload.decided_by = None;
        let id = upload.id.clone();
        self.state.pending_uploads.insert(upload)?;
        self.write_through();
        debug!(upload_id = %id, "submitted upload");
        Ok(())
    }

    pub fn get_upload_by_id(&self, id: &str) -> Result<&PendingUpload> {
        self.state.pending_uploads.require(id)
    }

    /// Uploads still waiting for a decision, oldest first.
    pub fn pending_uploads(&self) -> Vec<&PendingUpload> {
        self.state
            .pending_uploads
            .iter()
            .filter(|u| u.status == UploadStatus::Pending)
            .collect()
    }

    /// Publishes the candidate track and marks the upload approved.
    ///
    /// If publishing fails (for example the track id is already taken) the
    /// upload stays pending and the error is returned.
    pub fn approve_upload(&mut self, id: &str, moderator_id: &str) -> Result<()> {
        let track = self.require_pending_upload(id, moderator_id)?.track.clone();
        let owner_id = track.owner_id.clone();
        let track_id = track.id.clone();
        self.add_track(track)?;

        self.decide_upload(id, moderator_id, UploadStatus::Approved, None)?;
        self.push_notification(
            &owner_id,
            NotificationKind::Moderation,
            json!({ "uploadId": id, "trackId": track_id, "status": "approved" }),
        );
        self.write_through();
        debug!(upload_id = %id, track_id = %track_id, "approved upload");
        Ok(())
    }

    pub fn reject_upload(&mut self, id: &str, moderator_id: &str, note: Option<&str>) -> Result<()> {
        let owner_id = self
            .require_pending_upload(id, moderator_id)?
            .track
            .owner_id
            .clone();
        self.decide_upload(
            id,
            moderator_id,
            UploadStatus::Rejected,
            note.map(str::to_string),
        )?;
        self.push_notification(
            &owner_id,
            NotificationKind::Moderation,
            json!({ "uploadId": id, "status": "rejected", "note": note }),
        );
        self.write_through();
        debug!(upload_id = %id, "rejected upload");
        Ok(())
    }

    fn require_pending_upload(&self, id: &str, moderator_id: &str) -> Result<&PendingUpload> {
        if moderator_id.trim().is_empty() {
            return Err(MurmurError::invalid("moderator id: must not be empty"));
        }
        let upload = self.state.pending_uploads.require(id)?;
        if upload.status != UploadStatus::Pending {
            return Err(MurmurError::invalid(format!(
                "upload {}: already {:?}",
                id, upload.status
            )));
        }
        Ok(upload)
    }

    fn decide_upload(
        &mut self,
        id: &str,
        moderator_id: &str,
        status: UploadStatus,
        note: Option<String>,
    ) -> Result<()> {
        let upload = self.state.pending_uploads.require_mut(id)?;
        upload.status = status;
        upload.decided_at = Some(Utc::now());
        upload.decided_by = Some(moderator_id.to_string());
        if note.is_some() {
            upload.note = note;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Comment, Track, User, UserSnapshot};
    use crate::store::mem_backend::MemBackend;

    fn make_store() -> AudioStore<MemBackend> {
        let mut store = AudioStore::open(MemBackend::new());
        store
            .add_track(Track::new("t1", UserSnapshot::new("u1", "ana"), "Rain", "u", 3.0))
            .unwrap();
        store
            .add_comment(Comment::new("c1", "t1", UserSnapshot::new("u2", "bo"), "hm"))
            .unwrap();
        store
    }

    fn candidate(upload_id: &str, track_id: &str) -> PendingUpload {
        PendingUpload::new(
            upload_id,
            Track::new(track_id, UserSnapshot::new("u3", "cy"), "Waves", "u", 8.0),
        )
    }

    #[test]
    fn test_file_report_requires_target() {
        let mut store = make_store();
        store
            .file_report(ContentReport::new("r1", ReportTarget::Track, "t1", "u2", "spam"))
            .unwrap();
        store
            .file_report(ContentReport::new("r2", ReportTarget::Comment, "c1", "u1", "rude"))
            .unwrap();
        store
            .file_report(ContentReport::new("r3", ReportTarget::User, "u2", "u1", ""))
            .unwrap();

        assert!(matches!(
            store.file_report(ContentReport::new("r4", ReportTarget::Track, "nope", "u2", "")),
            Err(MurmurError::NotFound { kind: "track", .. })
        ));
        assert!(matches!(
            store.file_report(ContentReport::new("r1", ReportTarget::Track, "t1", "u2", "")),
            Err(MurmurError::AlreadyExists { .. })
        ));
        assert_eq!(store.reports_with_status(ReportStatus::Pending).len(), 3);
    }

    #[test]
    fn test_report_lifecycle() {
        let mut store = make_store();
        store
            .file_report(ContentReport::new("r1", ReportTarget::Track, "t1", "u2", "spam"))
            .unwrap();

        store.review_report("r1", "mod").unwrap();
        let report = store.get_report_by_id("r1").unwrap();
        assert_eq!(report.status, ReportStatus::Reviewed);
        assert_eq!(report.reviewed_by.as_deref(), Some("mod"));

        assert!(matches!(
            store.review_report("r1", "mod"),
            Err(MurmurError::Invalid(_))
        ));
        store.resolve_report("r1", "lead").unwrap();
        assert!(store.resolve_report("r1", "lead").is_err());
        assert_eq!(
            store.get_report_by_id("r1").unwrap().reviewed_by.as_deref(),
            Some("lead")
        );
        assert_eq!(store.reports_with_status(ReportStatus::Resolved).len(), 1);
    }

    #[test]
    fn test_pending_report_can_be_resolved_directly() {
        let mut store = make_store();
        store
            .file_report(ContentReport::new("r1", ReportTarget::Comment, "c1", "u1", ""))
            .unwrap();
        store.resolve_report("r1", "mod").unwrap();
        assert!(store.review_report("r1", "mod").is_err());
    }

    #[test]
    fn test_submit_validates_candidate() {
        let mut store = make_store();
        let mut bad = candidate("p1", "t9");
        bad.track.duration = 0.0;
        assert!(matches!(store.submit_upload(bad), Err(MurmurError::Invalid(_))));

        store.submit_upload(candidate("p1", "t9")).unwrap();
        assert!(store.submit_upload(candidate("p1", "t9")).is_err());
        assert_eq!(store.pending_uploads().len(), 1);
        assert!(store.get_track_by_id("t9").is_err());
    }

    #[test]
    fn test_approve_publishes_and_decides_once() {
        let mut store = make_store();
        store.submit_upload(candidate("p1", "t9")).unwrap();
        store.approve_upload("p1", "mod").unwrap();

        assert!(store.get_track_by_id("t9").is_ok());
        let upload = store.get_upload_by_id("p1").unwrap();
        assert_eq!(upload.status, UploadStatus::Approved);
        let decided_at = upload.decided_at;
        assert!(decided_at.is_some());
        assert_eq!(upload.decided_by.as_deref(), Some("mod"));

        assert!(matches!(
            store.approve_upload("p1", "other"),
            Err(MurmurError::Invalid(_))
        ));
        assert!(store.reject_upload("p1", "other", None).is_err());
        let upload = store.get_upload_by_id("p1").unwrap();
        assert_eq!(upload.decided_at, decided_at);
        assert_eq!(upload.decided_by.as_deref(), Some("mod"));
        assert!(store.pending_uploads().is_empty());

        let notes = store.notifications_for("u3");
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].kind, NotificationKind::Moderation);
    }

    #[test]
    fn test_approve_with_taken_track_id_stays_pending() {
        let mut store = make_store();
        store.submit_upload(candidate("p1", "t1")).unwrap();
        assert!(matches!(
            store.approve_upload("p1", "mod"),
            Err(MurmurError::AlreadyExists { kind: "track", .. })
        ));
        let upload = store.get_upload_by_id("p1").unwrap();
        assert_eq!(upload.status, UploadStatus::Pending);
        assert!(upload.decided_at.is_none());
    }

    #[test]
    fn test_reject_keeps_note() {
        let mut store = make_store();
        store.add_user(User::new("u3", "cy")).unwrap();
        store.submit_upload(candidate("p1", "t9")).unwrap();
        store.reject_upload("p1", "mod", Some("too quiet")).unwrap();

        let upload = store.get_upload_by_id("p1").unwrap();
        assert_eq!(upload.status, UploadStatus::Rejected);
        assert_eq!(upload.note.as_deref(), Some("too quiet"));
        assert!(store.get_track_by_id("t9").is_err());
        assert!(store.approve_upload("p1", "mod").is_err());
    }
}
