pub mod attendance;
pub mod directory;
pub mod leave;

pub use attendance::{AttendanceStore, MySqlAttendanceStore, NewAttendance};
pub use directory::{DirectoryStore, MySqlDirectoryStore};
pub use leave::{LeaveQuery, LeaveStore, MySqlLeaveStore, NewLeave};

/// MySQL signals unique-key violations under SQLSTATE 23000; the attendance
/// unique key on (employee_id, date) is the authoritative duplicate guard.
pub(crate) fn is_duplicate_key(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23000"))
}
