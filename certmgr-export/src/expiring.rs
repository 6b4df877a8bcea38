use certmgr_report::CertificateRecord;
use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};

use super::Result;
use crate::error::ExportError;

/// Date format of the leading token of a certmgr expiration value.
const EXPIRE_DATE_FORMAT: &str = "%d/%m/%Y";

/// `ExpirationWindow` decides whether a certificate is close enough to its expiration date to be
/// reported. A certificate is expiring once the current time is past the start of its warning
/// window, `days` calendar days before the expiration date.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct ExpirationWindow {
    days: u32,
}

impl ExpirationWindow {
    #[must_use]
    pub fn new(days: u32) -> Self {
        Self { days }
    }

    #[must_use]
    pub fn days(&self) -> u32 {
        self.days
    }

    /// Returns the expiration date of the record, read from the first whitespace delimited
    /// token of its expiration value.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::InvalidExpiration`] if that token is missing or is not a
    /// `DD/MM/YYYY` date.
    pub fn expiration_date(record: &CertificateRecord) -> Result<NaiveDate> {
        let date = record.expire.split_whitespace().next().unwrap_or_default();
        NaiveDate::parse_from_str(date, EXPIRE_DATE_FORMAT).map_err(|e| {
            ExportError::InvalidExpiration {
                serial: record.serial.clone(),
                value: record.expire.clone(),
                source: e,
            }
        })
    }

    /// Returns the local midnight that opens the warning window for a certificate expiring
    /// on `expiration`.
    #[must_use]
    pub fn warning_start(&self, expiration: NaiveDate) -> NaiveDateTime {
        // A window reaching past the earliest representable date covers all of time.
        expiration
            .checked_sub_days(Days::new(u64::from(self.days)))
            .unwrap_or(NaiveDate::MIN)
            .and_time(NaiveTime::MIN)
    }

    /// Returns true iff `now` (local wall-clock time) is strictly after the start of the
    /// record's warning window.
    ///
    /// There is no upper bound: a certificate that has already expired is still expiring.
    ///
    /// # Errors
    ///
    /// Returns an error if the record's expiration date can't be parsed.
    pub fn is_expiring(&self, record: &CertificateRecord, now: NaiveDateTime) -> Result<bool> {
        let warning_start = self.warning_start(Self::expiration_date(record)?);
        let expiring = now > warning_start;
        tracing::debug!(
            serial = %record.serial,
            %warning_start,
            expiring,
            "checked certificate expiration"
        );
        Ok(expiring)
    }

    /// Keep only the expiring records, preserving their order.
    ///
    /// # Errors
    ///
    /// Returns an error, and no records, if any record's expiration date can't be parsed.
    pub fn filter(
        &self,
        records: Vec<CertificateRecord>,
        now: NaiveDateTime,
    ) -> Result<Vec<CertificateRecord>> {
        let mut expiring = Vec::with_capacity(records.len());
        for record in records {
            if self.is_expiring(&record, now)? {
                expiring.push(record);
            }
        }
        Ok(expiring)
    }
}
