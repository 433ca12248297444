use time::{format_description::well_known::Rfc3339, OffsetDateTime, PrimitiveDateTime, UtcOffset};

pub(crate) fn primitive_now_utc() -> PrimitiveDateTime {
    to_primitive_utc(OffsetDateTime::now_utc())
}

pub(crate) fn to_primitive_utc(value: OffsetDateTime) -> PrimitiveDateTime {
    let utc = value.to_offset(UtcOffset::UTC);
    PrimitiveDateTime::new(utc.date(), utc.time())
}

pub(crate) fn format_primitive(value: PrimitiveDateTime) -> String {
    value.assume_utc().format(&Rfc3339).unwrap_or_else(|_| value.assume_utc().to_string())
}

pub(crate) fn format_optional(value: Option<PrimitiveDateTime>) -> Option<String> {
    value.map(format_primitive)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{Date, Time};

    #[test]
    fn format_primitive_outputs_utc_z() {
        let date = Date::from_calendar_date(2025, time::Month::July, 14).unwrap();
        let time = Time::from_hms(7, 30, 0).unwrap();
        let value = PrimitiveDateTime::new(date, time);
        assert_eq!(format_primitive(value), "2025-07-14T07:30:00Z");
    }

    #[test]
    fn to_primitive_utc_normalises_offsets() {
        let date = Date::from_calendar_date(2025, time::Month::July, 14).unwrap();
        let time = Time::from_hms(14, 30, 0).unwrap();
        let jakarta = UtcOffset::from_hms(7, 0, 0).unwrap();
        let local = PrimitiveDateTime::new(date, time).assume_offset(jakarta);

        let utc = to_primitive_utc(local);
        assert_eq!(format_primitive(utc), "2025-07-14T07:30:00Z");
    }

    #[test]
    fn format_optional_keeps_none() {
        assert!(format_optional(None).is_none());
    }
}
