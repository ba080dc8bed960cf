use super::*;

#[test]
fn allocate_job_name_increments_sequence() {
    let mut project = Project::new(ProjectId::new("proj-1"), "cryo1");
    assert_eq!(project.allocate_job_name(), "cryo1_J1");
    assert_eq!(project.allocate_job_name(), "cryo1_J2");
    assert_eq!(project.next_job_seq, 3);
}

#[test]
fn new_project_starts_sequence_at_one() {
    let project = Project::new(ProjectId::new("proj-1"), "cryo1");
    assert_eq!(project.next_job_seq, 1);
}
