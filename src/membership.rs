//! Keeps `Group.students` / `Group.studentsCount` and the mirrored
//! `Student.groupId` / `Student.group` fields consistent with each other.

use serde_json::{Map, Value};

use crate::constants::*;
use crate::error::ApiError;
use crate::models::{CreateGroupPayload, Group, Student};
use crate::repository::{fresh_id, merge_record, position};
use crate::store::{DocumentStore, PendingWrite};
use crate::utils::or_default_text;

fn group_index(groups: &[Group], group_id: i64) -> Result<usize, ApiError> {
    position(groups, group_id).ok_or(ApiError::NotFound("Group"))
}

fn student_index(students: &[Student], student_id: i64) -> Result<usize, ApiError> {
    position(students, student_id).ok_or(ApiError::NotFound("Student"))
}

/// Drops the student from every group except `keep`.
fn detach_from_groups(groups: &mut [Group], student_id: i64, keep: Option<i64>) {
    for group in groups.iter_mut() {
        if Some(group.id) != keep && group.drop_member(student_id) {
            tracing::info!(
                group_id = group.id,
                student_id,
                "student dropped from group"
            );
        }
    }
}

async fn commit_groups_and_students(
    store: &DocumentStore,
    groups: &[Group],
    students: &[Student],
) -> Result<(), ApiError> {
    store
        .commit(vec![
            PendingWrite::new(GROUPS_COLLECTION, groups)?,
            PendingWrite::new(STUDENTS_COLLECTION, students)?,
        ])
        .await?;
    Ok(())
}

pub async fn add_student_to_group(
    store: &DocumentStore,
    group_id: i64,
    student_id: i64,
) -> Result<Group, ApiError> {
    let _guard = store.lock().await;
    let mut groups: Vec<Group> = store.load(GROUPS_COLLECTION).await?;
    let mut students: Vec<Student> = store.load(STUDENTS_COLLECTION).await?;

    let gi = group_index(&groups, group_id)?;
    let si = student_index(&students, student_id)?;

    if groups[gi].has_member(student_id) {
        tracing::warn!(group_id, student_id, "student already in group");
        return Err(ApiError::AlreadyMember);
    }
    if groups[gi].is_full() {
        tracing::warn!(
            group_id,
            student_id,
            capacity = groups[gi].capacity(),
            "group is full"
        );
        return Err(ApiError::CapacityExceeded);
    }

    detach_from_groups(&mut groups, student_id, Some(group_id));
    groups[gi].push_member(student_id);
    students[si].group_id = Some(group_id);
    students[si].group = groups[gi].name.clone();

    commit_groups_and_students(store, &groups, &students).await?;

    tracing::info!(group_id, student_id, "student added to group");
    Ok(groups[gi].clone())
}

/// Removing a student that is not listed is not an error; the student's
/// group fields are cleared either way, and so is any other group that
/// still lists them.
pub async fn remove_student_from_group(
    store: &DocumentStore,
    group_id: i64,
    student_id: i64,
) -> Result<Group, ApiError> {
    let _guard = store.lock().await;
    let mut groups: Vec<Group> = store.load(GROUPS_COLLECTION).await?;
    let mut students: Vec<Student> = store.load(STUDENTS_COLLECTION).await?;

    let gi = group_index(&groups, group_id)?;
    let si = student_index(&students, student_id)?;

    detach_from_groups(&mut groups, student_id, None);
    students[si].leave_group();

    commit_groups_and_students(store, &groups, &students).await?;

    tracing::info!(group_id, student_id, "student removed from group");
    Ok(groups[gi].clone())
}

/// Creates a group and enrolls `studentIds` in one step. Ids that do not
/// resolve to a student are dropped; capacity applies as on the add path.
pub async fn create_group(
    store: &DocumentStore,
    payload: CreateGroupPayload,
) -> Result<Group, ApiError> {
    let _guard = store.lock().await;
    let mut groups: Vec<Group> = store.load(GROUPS_COLLECTION).await?;
    let mut students: Vec<Student> = store.load(STUDENTS_COLLECTION).await?;

    let mut extra = payload.extra;
    for reserved in ["id", "students", "studentsCount"] {
        extra.remove(reserved);
    }

    let mut group = Group {
        id: fresh_id(store, &groups),
        name: payload.name,
        teacher_id: payload.teacher_id,
        capacity: Some(
            payload
                .capacity
                .filter(|c| *c > 0)
                .unwrap_or(DEFAULT_GROUP_CAPACITY as i64),
        ),
        status: Some(or_default_text(payload.status, GROUP_STATUS_UPCOMING)),
        students: Vec::new(),
        students_count: 0,
        extra,
    };

    let mut enrolled = Vec::new();
    for student_id in payload.student_ids.unwrap_or_default() {
        if enrolled.contains(&student_id) {
            continue;
        }
        if position(&students, student_id).is_none() {
            tracing::warn!(student_id, "skipping unknown student in new group");
            continue;
        }
        enrolled.push(student_id);
    }

    if enrolled.len() > group.capacity() {
        tracing::warn!(
            requested = enrolled.len(),
            capacity = group.capacity(),
            "bulk enrollment exceeds group capacity"
        );
        return Err(ApiError::CapacityExceeded);
    }

    for student_id in &enrolled {
        detach_from_groups(&mut groups, *student_id, None);
        group.push_member(*student_id);
        if let Some(si) = position(&students, *student_id) {
            students[si].group_id = Some(group.id);
            students[si].group = group.name.clone();
        }
    }

    groups.push(group.clone());
    if enrolled.is_empty() {
        store.save(GROUPS_COLLECTION, &groups).await?;
    } else {
        commit_groups_and_students(store, &groups, &students).await?;
    }

    tracing::info!(group_id = group.id, enrolled = enrolled.len(), "group created");
    Ok(group)
}

/// Merge-update of a group. A rename is mirrored onto the cached `group`
/// field of every student pointing at this group.
pub async fn update_group(
    store: &DocumentStore,
    group_id: i64,
    patch: Map<String, Value>,
) -> Result<Group, ApiError> {
    let _guard = store.lock().await;
    let mut groups: Vec<Group> = store.load(GROUPS_COLLECTION).await?;

    let gi = group_index(&groups, group_id)?;
    let previous_name = groups[gi].name.clone();
    let updated = merge_record(&groups[gi], patch)?;
    let renamed = updated.name != previous_name;
    groups[gi] = updated.clone();

    if renamed {
        let mut students: Vec<Student> = store.load(STUDENTS_COLLECTION).await?;
        for student in students.iter_mut().filter(|s| s.group_id == Some(group_id)) {
            student.group = updated.name.clone();
        }
        commit_groups_and_students(store, &groups, &students).await?;
    } else {
        store.save(GROUPS_COLLECTION, &groups).await?;
    }

    tracing::info!(group_id, renamed, "group updated");
    Ok(updated)
}

/// Sets `groupId` / `group` on a student directly, without touching any
/// group's membership list or checking capacity.
pub async fn assign_group_fields(
    store: &DocumentStore,
    student_id: i64,
    group_id: Option<i64>,
    group_name: Option<Value>,
) -> Result<Student, ApiError> {
    let _guard = store.lock().await;
    let mut students: Vec<Student> = store.load(STUDENTS_COLLECTION).await?;

    let si = student_index(&students, student_id)?;
    students[si].group_id = group_id;
    students[si].group = group_name;
    store.save(STUDENTS_COLLECTION, &students).await?;

    tracing::info!(student_id, ?group_id, "student group fields set directly");
    Ok(students[si].clone())
}
