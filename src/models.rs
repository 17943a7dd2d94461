//! Stored records. Only the fields the workflows compute with are typed;
//! everything else is carried as free-form JSON, either in a named
//! `Option<Value>` or in the flattened `extra` map.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::*;
use crate::repository::Entity;
use crate::utils::{lenient, text};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Entity for Teacher {
    const COLLECTION: &'static str = TEACHERS_COLLECTION;
    const LABEL: &'static str = "Teacher";

    fn id(&self) -> i64 {
        self.id
    }
}

/// Students are stored with either `name` or `firstName`/`lastName`
/// depending on which screen created them; both are kept.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<Value>,
    /// "paid" / "unpaid"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment: Option<Value>,
    /// Outstanding amount; negative means overpaid
    #[serde(
        default,
        deserialize_with = "lenient::float",
        skip_serializing_if = "Option::is_none"
    )]
    pub balance: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient::int",
        skip_serializing_if = "Option::is_none"
    )]
    pub group_id: Option<i64>,
    /// Cached copy of the group's name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Student {
    /// "first last" when either part is present, otherwise the single `name`.
    pub fn display_name(&self) -> Option<String> {
        let first = text(self.first_name.as_ref());
        let last = text(self.last_name.as_ref());
        if first.is_some() || last.is_some() {
            let full = format!(
                "{} {}",
                first.unwrap_or_default(),
                last.unwrap_or_default()
            );
            return Some(full.trim().to_string());
        }
        text(self.name.as_ref())
    }

    pub fn leave_group(&mut self) {
        self.group_id = None;
        self.group = None;
    }
}

impl Entity for Student {
    const COLLECTION: &'static str = STUDENTS_COLLECTION;
    const LABEL: &'static str = "Student";

    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<Value>,
    #[serde(
        default,
        deserialize_with = "lenient::int",
        skip_serializing_if = "Option::is_none"
    )]
    pub teacher_id: Option<i64>,
    #[serde(
        default,
        deserialize_with = "lenient::int",
        skip_serializing_if = "Option::is_none"
    )]
    pub capacity: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Value>,
    /// Authoritative membership list, in join order
    #[serde(default, deserialize_with = "lenient::ids")]
    pub students: Vec<i64>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub students_count: usize,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Group {
    /// A group without a stored capacity accepts nobody.
    pub fn capacity(&self) -> usize {
        self.capacity.unwrap_or(0).max(0) as usize
    }

    pub fn is_full(&self) -> bool {
        self.students.len() >= self.capacity()
    }

    pub fn has_member(&self, student_id: i64) -> bool {
        self.students.contains(&student_id)
    }

    pub fn sync_count(&mut self) {
        self.students_count = self.students.len();
    }

    pub fn push_member(&mut self, student_id: i64) {
        self.students.push(student_id);
        self.sync_count();
    }

    /// Returns whether the student was listed.
    pub fn drop_member(&mut self, student_id: i64) -> bool {
        let before = self.students.len();
        self.students.retain(|id| *id != student_id);
        self.sync_count();
        before != self.students.len()
    }
}

impl Entity for Group {
    const COLLECTION: &'static str = GROUPS_COLLECTION;
    const LABEL: &'static str = "Group";

    fn id(&self) -> i64 {
        self.id
    }

    fn normalize(&mut self) {
        self.sync_count();
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: i64,
    #[serde(default, deserialize_with = "lenient::int")]
    pub student_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient::float")]
    pub amount: Option<f64>,
    /// cash, card/click, payme, transfer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_type: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Entity for Payment {
    const COLLECTION: &'static str = PAYMENTS_COLLECTION;
    const LABEL: &'static str = "Payment";

    fn id(&self) -> i64 {
        self.id
    }
}

/// Homework for one group. `title`, `dueDate` and the like live in `extra`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i64,
    #[serde(default, deserialize_with = "lenient::int")]
    pub group_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub teacher_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Entity for Task {
    const COLLECTION: &'static str = TASKS_COLLECTION;
    const LABEL: &'static str = "Task";

    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Entity for Company {
    const COLLECTION: &'static str = COMPANIES_COLLECTION;
    const LABEL: &'static str = "Company";

    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    pub id: i64,
    #[serde(default, deserialize_with = "lenient::int")]
    pub company_id: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Entity for Branch {
    const COLLECTION: &'static str = BRANCHES_COLLECTION;
    const LABEL: &'static str = "Branch";

    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateGroupPayload {
    pub name: Option<Value>,
    #[serde(deserialize_with = "lenient::int")]
    pub teacher_id: Option<i64>,
    #[serde(deserialize_with = "lenient::int")]
    pub capacity: Option<i64>,
    pub status: Option<Value>,
    #[serde(deserialize_with = "lenient::int_list")]
    pub student_ids: Option<Vec<i64>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body of `/groups/{id}/add-student` and `/groups/{id}/remove-student`.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct MembershipPayload {
    #[serde(default, deserialize_with = "lenient::int")]
    pub student_id: Option<i64>,
}

#[derive(Serialize, Debug)]
pub struct MembershipResponse {
    pub message: String,
    pub group: Group,
}

/// Body of `PUT /students/{id}/group`.
#[derive(Deserialize, Debug, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct AssignGroupPayload {
    #[serde(deserialize_with = "lenient::int")]
    pub group_id: Option<i64>,
    pub group_name: Option<Value>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct RecordPaymentPayload {
    #[serde(deserialize_with = "lenient::int")]
    pub student_id: Option<i64>,
    #[serde(deserialize_with = "lenient::float")]
    pub amount: Option<f64>,
    pub payment_type: Option<Value>,
    pub description: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateTaskPayload {
    #[serde(deserialize_with = "lenient::int")]
    pub group_id: Option<i64>,
    #[serde(deserialize_with = "lenient::int")]
    pub teacher_id: Option<i64>,
    pub description: Option<Value>,
    pub status: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `GET /branches?companyId=...`
#[derive(Deserialize, Debug, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct BranchFilter {
    pub company_id: Option<i64>,
}

#[derive(Serialize, Debug)]
pub struct MessageResponse {
    pub message: String,
}
