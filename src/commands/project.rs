use crate::error::Result;
use crate::models::Project;
use crate::state::AppContext;

pub fn list_projects(ctx: &AppContext) -> Vec<Project> {
    ctx.registry.all().to_vec()
}

pub fn get_project(ctx: &AppContext, id: &str) -> Result<Project> {
    ctx.registry.get(id).cloned()
}
