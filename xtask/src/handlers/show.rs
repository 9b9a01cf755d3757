use crate::models::project::get_project;

/// Prints the project resolved from `target`, including its subprojects.
pub fn show_project(target: &str) {
    println!("🎯 Target '{target}':\n");
    get_project(target).render(0);
}
