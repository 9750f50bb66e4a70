//! In-memory store doubles and a pinned clock for engine tests. The
//! attendance double enforces the same (employee, date) uniqueness the
//! MySQL key does, so conflict paths behave identically.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};

use crate::clock::Clock;
use crate::error::HrError;
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::model::employee::Employee;
use crate::model::hr::Hr;
use crate::model::leave_request::{LeaveRequest, LeaveStatus};
use crate::store::{
    AttendanceStore, DirectoryStore, LeaveQuery, LeaveStore, NewAttendance, NewLeave,
};

pub(crate) struct FixedClock {
    pub today: NaiveDate,
    pub time: NaiveTime,
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.today
    }

    fn time_now(&self) -> NaiveTime {
        self.time
    }
}

pub(crate) fn employee(id: u64, hr_id: u64) -> Employee {
    named_employee(id, "John Doe", hr_id)
}

pub(crate) fn named_employee(id: u64, name: &str, hr_id: u64) -> Employee {
    Employee {
        id,
        name: name.to_string(),
        designation: "Software Engineer".to_string(),
        phone: None,
        department_id: 10,
        hr_id,
        join_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        deleted: false,
    }
}

pub(crate) fn hr(id: u64) -> Hr {
    Hr {
        id,
        name: format!("HR {id}"),
        phone: None,
        department_id: 10,
    }
}

pub(crate) fn record(
    employee_id: u64,
    date: NaiveDate,
    status: AttendanceStatus,
    total_hours: Option<f64>,
) -> AttendanceRecord {
    AttendanceRecord {
        id: 0,
        employee_id,
        hr_id: Some(7),
        date,
        status,
        check_in: None,
        check_out: None,
        total_hours,
    }
}

#[derive(Default)]
pub(crate) struct MemoryDirectory {
    employees: Mutex<HashMap<u64, Employee>>,
    hrs: Mutex<HashMap<u64, Hr>>,
}

impl MemoryDirectory {
    pub fn add_employee(&self, employee: Employee) {
        self.employees.lock().unwrap().insert(employee.id, employee);
    }

    pub fn add_hr(&self, hr: Hr) {
        self.hrs.lock().unwrap().insert(hr.id, hr);
    }
}

#[async_trait]
impl DirectoryStore for MemoryDirectory {
    async fn employee(&self, id: u64) -> Result<Option<Employee>, HrError> {
        Ok(self
            .employees
            .lock()
            .unwrap()
            .get(&id)
            .filter(|e| !e.deleted)
            .cloned())
    }

    async fn employee_with_deleted(&self, id: u64) -> Result<Option<Employee>, HrError> {
        Ok(self.employees.lock().unwrap().get(&id).cloned())
    }

    async fn hr(&self, id: u64) -> Result<Option<Hr>, HrError> {
        Ok(self.hrs.lock().unwrap().get(&id).cloned())
    }

    async fn team_size(&self, hr_id: u64) -> Result<u64, HrError> {
        Ok(self
            .employees
            .lock()
            .unwrap()
            .values()
            .filter(|e| e.hr_id == hr_id && !e.deleted)
            .count() as u64)
    }
}

pub(crate) struct MemoryAttendance {
    records: Mutex<Vec<AttendanceRecord>>,
    next_id: AtomicU64,
}

impl Default for MemoryAttendance {
    fn default() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

impl MemoryAttendance {
    /// Inserts a prebuilt record directly, bypassing engine rules.
    pub fn seed(&self, mut record: AttendanceRecord) {
        record.id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.records.lock().unwrap().push(record);
    }
}

#[async_trait]
impl AttendanceStore for MemoryAttendance {
    async fn exists(&self, employee_id: u64, date: NaiveDate) -> Result<bool, HrError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .any(|r| r.employee_id == employee_id && r.date == date))
    }

    async fn insert(&self, record: NewAttendance) -> Result<AttendanceRecord, HrError> {
        let mut records = self.records.lock().unwrap();
        if records
            .iter()
            .any(|r| r.employee_id == record.employee_id && r.date == record.date)
        {
            return Err(HrError::DuplicateRecord);
        }

        let stored = AttendanceRecord {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            employee_id: record.employee_id,
            hr_id: record.hr_id,
            date: record.date,
            status: record.status,
            check_in: record.check_in,
            check_out: None,
            total_hours: None,
        };
        records.push(stored.clone());
        Ok(stored)
    }

    async fn by_employee_and_date(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, HrError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.employee_id == employee_id && r.date == date)
            .cloned())
    }

    async fn complete_checkout(
        &self,
        id: u64,
        check_out: NaiveTime,
        total_hours: f64,
        status: AttendanceStatus,
    ) -> Result<u64, HrError> {
        let mut records = self.records.lock().unwrap();
        match records
            .iter_mut()
            .find(|r| r.id == id && r.check_out.is_none())
        {
            Some(record) => {
                record.check_out = Some(check_out);
                record.total_hours = Some(total_hours);
                record.status = status;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn for_employee(&self, employee_id: u64) -> Result<Vec<AttendanceRecord>, HrError> {
        let mut records: Vec<_> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.employee_id == employee_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(records)
    }

    async fn for_employee_between(
        &self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, HrError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.employee_id == employee_id && r.date >= start && r.date <= end)
            .cloned()
            .collect())
    }

    async fn for_hr_between(
        &self,
        hr_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, HrError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.hr_id == Some(hr_id) && r.date >= start && r.date <= end)
            .cloned()
            .collect())
    }

    async fn between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, HrError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.date >= start && r.date <= end)
            .cloned()
            .collect())
    }
}

pub(crate) struct MemoryLeaves {
    leaves: Mutex<Vec<LeaveRequest>>,
    next_id: AtomicU64,
}

impl Default for MemoryLeaves {
    fn default() -> Self {
        Self {
            leaves: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

#[async_trait]
impl LeaveStore for MemoryLeaves {
    async fn insert(&self, leave: NewLeave) -> Result<LeaveRequest, HrError> {
        let stored = LeaveRequest {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            employee_id: leave.employee_id,
            start_date: leave.start_date,
            end_date: leave.end_date,
            category: leave.category,
            sub_category: leave.sub_category,
            reason: leave.reason,
            status: LeaveStatus::Pending,
            hr_id: None,
            created_at: None,
        };
        self.leaves.lock().unwrap().push(stored.clone());
        Ok(stored)
    }

    async fn find(&self, id: u64) -> Result<Option<LeaveRequest>, HrError> {
        Ok(self
            .leaves
            .lock()
            .unwrap()
            .iter()
            .find(|l| l.id == id)
            .cloned())
    }

    async fn transition(
        &self,
        id: u64,
        status: LeaveStatus,
        hr_id: u64,
    ) -> Result<u64, HrError> {
        let mut leaves = self.leaves.lock().unwrap();
        match leaves
            .iter_mut()
            .find(|l| l.id == id && l.status == LeaveStatus::Pending)
        {
            Some(leave) => {
                leave.status = status;
                leave.hr_id = Some(hr_id);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn list(&self, query: &LeaveQuery) -> Result<(Vec<LeaveRequest>, i64), HrError> {
        let leaves: Vec<_> = self
            .leaves
            .lock()
            .unwrap()
            .iter()
            .filter(|l| query.employee_id.is_none_or(|id| l.employee_id == id))
            .filter(|l| query.status.is_none_or(|s| l.status == s))
            .cloned()
            .collect();
        let total = leaves.len() as i64;
        let offset = ((query.page.max(1) - 1) * query.per_page) as usize;
        let page = leaves
            .into_iter()
            .skip(offset)
            .take(query.per_page as usize)
            .collect();
        Ok((page, total))
    }
}
