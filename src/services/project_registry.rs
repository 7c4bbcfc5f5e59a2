use crate::error::{FleetError, Result};
use crate::models::Project;
use std::collections::HashMap;
use tracing::info;

/// Ordered, immutable set of projects with point lookup by id.
#[derive(Debug, Clone)]
pub struct ProjectRegistry {
    projects: Vec<Project>,
    index: HashMap<String, usize>,
}

impl ProjectRegistry {
    /// Builds the registry, failing fast on duplicate project ids or on a
    /// process/service name declared by more than one project.
    pub fn new(projects: Vec<Project>) -> Result<Self> {
        let mut index = HashMap::new();
        let mut process_owner: HashMap<&str, &str> = HashMap::new();
        let mut service_owner: HashMap<&str, &str> = HashMap::new();

        for (position, project) in projects.iter().enumerate() {
            let id = project.id.as_str();
            if index.insert(id.to_string(), position).is_some() {
                return Err(FleetError::Config(format!("duplicate project id '{}'", id)));
            }

            for process in &project.pm2_processes {
                if let Some(owner) = process_owner.insert(process.as_str(), id) {
                    return Err(FleetError::Config(format!(
                        "process '{}' is declared by both '{}' and '{}'",
                        process, owner, id
                    )));
                }
            }

            for service in &project.systemd_services {
                if let Some(owner) = service_owner.insert(service.as_str(), id) {
                    return Err(FleetError::Config(format!(
                        "service '{}' is declared by both '{}' and '{}'",
                        service, owner, id
                    )));
                }
            }
        }

        info!(projects = projects.len(), "project registry loaded");
        Ok(Self { projects, index })
    }

    pub fn all(&self) -> &[Project] {
        &self.projects
    }

    pub fn get(&self, id: &str) -> Result<&Project> {
        self.index
            .get(id)
            .map(|&position| &self.projects[position])
            .ok_or_else(|| FleetError::not_found(format!("project '{}'", id)))
    }

    pub fn ids(&self) -> Vec<&str> {
        self.projects.iter().map(|p| p.id.as_str()).collect()
    }
}
