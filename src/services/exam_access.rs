use thiserror::Error;
use time::PrimitiveDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub(crate) enum ExamAccessError {
    #[error("You are not registered for this exam")]
    NotRegistered,
    #[error("Exam has not started yet")]
    NotStarted,
    #[error("Exam has ended")]
    Ended,
}

/// Eligibility of a student for an exam at `now`. The window is inclusive on
/// both ends; roster membership is checked before the window.
pub(crate) fn check_access(
    on_roster: bool,
    start_time: PrimitiveDateTime,
    end_time: PrimitiveDateTime,
    now: PrimitiveDateTime,
) -> Result<(), ExamAccessError> {
    if !on_roster {
        return Err(ExamAccessError::NotRegistered);
    }
    if now < start_time {
        return Err(ExamAccessError::NotStarted);
    }
    if now > end_time {
        return Err(ExamAccessError::Ended);
    }
    Ok(())
}

pub(crate) fn validate_window(
    start_time: PrimitiveDateTime,
    end_time: PrimitiveDateTime,
) -> Result<(), String> {
    if end_time <= start_time {
        return Err("end_time must be after start_time".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    const START: PrimitiveDateTime = datetime!(2026-03-01 09:00);
    const END: PrimitiveDateTime = datetime!(2026-03-01 11:00);

    #[test]
    fn roster_is_checked_before_window() {
        let before_start = datetime!(2026-03-01 08:00);
        assert_eq!(
            check_access(false, START, END, before_start),
            Err(ExamAccessError::NotRegistered)
        );
    }

    #[test]
    fn rejects_outside_window() {
        assert_eq!(
            check_access(true, START, END, datetime!(2026-03-01 08:59:59)),
            Err(ExamAccessError::NotStarted)
        );
        assert_eq!(
            check_access(true, START, END, datetime!(2026-03-01 11:00:01)),
            Err(ExamAccessError::Ended)
        );
    }

    #[test]
    fn window_bounds_are_inclusive() {
        assert!(check_access(true, START, END, START).is_ok());
        assert!(check_access(true, START, END, END).is_ok());
        assert!(check_access(true, START, END, datetime!(2026-03-01 10:00)).is_ok());
    }

    #[test]
    fn messages_match_api_detail() {
        assert_eq!(ExamAccessError::NotStarted.to_string(), "Exam has not started yet");
        assert_eq!(ExamAccessError::Ended.to_string(), "Exam has ended");
    }

    #[test]
    fn window_must_move_forward() {
        assert!(validate_window(START, END).is_ok());
        assert!(validate_window(END, START).is_err());
        assert!(validate_window(START, START).is_err());
    }
}
