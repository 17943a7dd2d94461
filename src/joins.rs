//! Read-side views that embed related records. Membership here is derived
//! from each student's `groupId`, not from the stored `Group.students` list.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::constants::*;
use crate::error::ApiError;
use crate::models::{Group, Payment, Student, Task, Teacher};
use crate::repository::{Entity, to_fields};
use crate::store::DocumentStore;
use crate::utils::text;

/// Students grouped by the group they point at, in collection order.
pub struct MembershipIndex<'a> {
    by_group: HashMap<i64, Vec<&'a Student>>,
}

impl<'a> MembershipIndex<'a> {
    pub fn build(students: &'a [Student]) -> Self {
        let mut by_group: HashMap<i64, Vec<&'a Student>> = HashMap::new();
        for student in students {
            if let Some(group_id) = student.group_id {
                by_group.entry(group_id).or_default().push(student);
            }
        }
        Self { by_group }
    }

    pub fn members(&self, group_id: i64) -> &[&'a Student] {
        self.by_group
            .get(&group_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn member_ids(&self, group_id: i64) -> Vec<i64> {
        self.members(group_id).iter().map(|s| s.id).collect()
    }
}

fn by_id<T: Entity>(records: &[T]) -> HashMap<i64, &T> {
    records.iter().map(|record| (record.id(), record)).collect()
}

fn to_value<T: Serialize>(record: &T) -> Result<Value, ApiError> {
    serde_json::to_value(record)
        .map_err(|e| ApiError::Internal(format!("failed to encode record: {}", e)))
}

pub fn group_with_details(
    group: &Group,
    teachers: &HashMap<i64, &Teacher>,
    index: &MembershipIndex<'_>,
) -> Result<Map<String, Value>, ApiError> {
    let teacher = group.teacher_id.and_then(|id| teachers.get(&id).copied());
    let member_ids = index.member_ids(group.id);

    let mut view = to_fields(group)?;
    view.insert(
        "teacherName".to_string(),
        Value::from(match teacher {
            Some(t) => text(t.name.as_ref()).unwrap_or_default(),
            None => TEACHER_NOT_FOUND_SENTINEL.to_string(),
        }),
    );
    view.insert(
        "teacher".to_string(),
        match teacher {
            Some(t) => to_value(t)?,
            None => Value::Null,
        },
    );
    view.insert("studentsCount".to_string(), Value::from(member_ids.len()));
    view.insert("students".to_string(), Value::from(member_ids));
    Ok(view)
}

pub async fn list_groups_with_details(
    store: &DocumentStore,
) -> Result<Vec<Map<String, Value>>, ApiError> {
    let groups: Vec<Group> = store.load(GROUPS_COLLECTION).await?;
    let teachers: Vec<Teacher> = store.load(TEACHERS_COLLECTION).await?;
    let students: Vec<Student> = store.load(STUDENTS_COLLECTION).await?;

    let teachers = by_id(&teachers);
    let index = MembershipIndex::build(&students);
    groups
        .iter()
        .map(|group| group_with_details(group, &teachers, &index))
        .collect()
}

/// The group with full student records and the resolved teacher embedded.
pub async fn group_detail(
    store: &DocumentStore,
    group_id: i64,
) -> Result<Map<String, Value>, ApiError> {
    let groups: Vec<Group> = store.load(GROUPS_COLLECTION).await?;
    let group = groups
        .iter()
        .find(|g| g.id == group_id)
        .ok_or(ApiError::NotFound("Group"))?;

    let students: Vec<Student> = store.load(STUDENTS_COLLECTION).await?;
    let teachers: Vec<Teacher> = store.load(TEACHERS_COLLECTION).await?;

    let members: Vec<&Student> = students
        .iter()
        .filter(|s| s.group_id == Some(group_id))
        .collect();
    let teacher = group
        .teacher_id
        .and_then(|id| teachers.iter().find(|t| t.id == id));

    let mut view = to_fields(group)?;
    view.insert("students".to_string(), to_value(&members)?);
    view.insert(
        "teacher".to_string(),
        match teacher {
            Some(t) => to_value(t)?,
            None => Value::Null,
        },
    );
    Ok(view)
}

pub fn payment_with_student_name(
    payment: &Payment,
    students: &HashMap<i64, &Student>,
) -> Result<Map<String, Value>, ApiError> {
    let student_name = payment
        .student_id
        .and_then(|id| students.get(&id))
        .and_then(|s| s.display_name())
        .unwrap_or_else(|| UNKNOWN_SENTINEL.to_string());

    let mut view = to_fields(payment)?;
    view.insert("studentName".to_string(), Value::from(student_name));
    Ok(view)
}

pub async fn list_payments_with_student_names(
    store: &DocumentStore,
) -> Result<Vec<Map<String, Value>>, ApiError> {
    let payments: Vec<Payment> = store.load(PAYMENTS_COLLECTION).await?;
    let students: Vec<Student> = store.load(STUDENTS_COLLECTION).await?;

    let students = by_id(&students);
    payments
        .iter()
        .map(|payment| payment_with_student_name(payment, &students))
        .collect()
}

pub async fn list_tasks_with_names(
    store: &DocumentStore,
) -> Result<Vec<Map<String, Value>>, ApiError> {
    let tasks: Vec<Task> = store.load(TASKS_COLLECTION).await?;
    let groups: Vec<Group> = store.load(GROUPS_COLLECTION).await?;
    let teachers: Vec<Teacher> = store.load(TEACHERS_COLLECTION).await?;

    let groups = by_id(&groups);
    let teachers = by_id(&teachers);

    let mut views = Vec::with_capacity(tasks.len());
    for task in &tasks {
        let group_name = task
            .group_id
            .and_then(|id| groups.get(&id))
            .and_then(|g| text(g.name.as_ref()))
            .unwrap_or_else(|| UNKNOWN_SENTINEL.to_string());
        let teacher_name = task
            .teacher_id
            .and_then(|id| teachers.get(&id))
            .and_then(|t| text(t.name.as_ref()))
            .unwrap_or_else(|| UNKNOWN_SENTINEL.to_string());

        let mut view = to_fields(task)?;
        view.insert("groupName".to_string(), Value::from(group_name));
        view.insert("teacherName".to_string(), Value::from(teacher_name));
        views.push(view);
    }
    Ok(views)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse<T: serde::de::DeserializeOwned>(value: Value) -> Vec<T> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn index_follows_student_group_ids() {
        let students: Vec<Student> = parse(json!([
            {"id": 1, "groupId": 10},
            {"id": 2},
            {"id": 3, "groupId": 10},
            {"id": 4, "groupId": 20}
        ]));
        let index = MembershipIndex::build(&students);
        assert_eq!(index.member_ids(10), vec![1, 3]);
        assert_eq!(index.member_ids(20), vec![4]);
        assert!(index.members(30).is_empty());
    }

    #[test]
    fn group_view_counts_live_members_not_stored_list() {
        let groups: Vec<Group> = parse(json!([
            {"id": 10, "name": "G", "teacherId": 5, "students": [1, 2, 3], "studentsCount": 3}
        ]));
        let teachers: Vec<Teacher> = parse(json!([{"id": 5, "name": "Aziz"}]));
        let students: Vec<Student> = parse(json!([{"id": 1, "groupId": 10}, {"id": 2}]));

        let teachers = by_id(&teachers);
        let index = MembershipIndex::build(&students);
        let view = group_with_details(&groups[0], &teachers, &index).unwrap();

        assert_eq!(view["teacherName"], json!("Aziz"));
        assert_eq!(view["teacher"]["id"], json!(5));
        assert_eq!(view["studentsCount"], json!(1));
        assert_eq!(view["students"], json!([1]));
    }

    #[test]
    fn dangling_teacher_uses_sentinel() {
        let groups: Vec<Group> = parse(json!([{"id": 10, "teacherId": 99}]));
        let students: Vec<Student> = Vec::new();
        let view =
            group_with_details(&groups[0], &HashMap::new(), &MembershipIndex::build(&students))
                .unwrap();
        assert_eq!(view["teacherName"], json!(TEACHER_NOT_FOUND_SENTINEL));
        assert_eq!(view["teacher"], Value::Null);
    }

    #[test]
    fn payment_names_resolve_or_fall_back() {
        let students: Vec<Student> = parse(json!([
            {"id": 1, "firstName": "Madina", "lastName": "Yusupova"}
        ]));
        let payments: Vec<Payment> = parse(json!([
            {"id": 100, "studentId": 1, "amount": 10},
            {"id": 101, "studentId": 2, "amount": 10}
        ]));
        let students = by_id(&students);

        let known = payment_with_student_name(&payments[0], &students).unwrap();
        let unknown = payment_with_student_name(&payments[1], &students).unwrap();
        assert_eq!(known["studentName"], json!("Madina Yusupova"));
        assert_eq!(unknown["studentName"], json!(UNKNOWN_SENTINEL));
    }
}
