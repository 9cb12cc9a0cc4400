use crate::*;

#[test]
fn suffixes_follow_allocation_order() {
    let mut names = Names::new();
    assert_eq!(names.assign_name("core"), "core");
    assert_eq!(names.assign_name("core"), "core_1");
    assert_eq!(names.assign_name("core"), "core_2");
    assert_eq!(names.assign_name("alu"), "alu");
}

#[test]
fn skips_existing_suffixes() {
    let mut names: Names = ["a", "a_1"].into_iter().collect();
    assert_eq!(names.assign_name("a"), "a_2");
    assert_eq!(names.assign_name("a_1"), "a_1_1");
}

#[test]
fn unique_name_does_not_record() {
    let taken = ["x"];
    assert_eq!(unique_name("x", |n| taken.contains(&n)), "x_1");
    assert_eq!(unique_name("y", |n| taken.contains(&n)), "y");
}
