//! Storage trait implementations for the in-memory backend.

use super::transaction::InMemoryTransaction;
use super::InMemoryGraphStore;
use crate::domain::{DependencyEdge, DependencyStats, TaskId, TaskStatus};
use crate::error::Result;
use crate::storage::{EdgeReader, GraphStore, GraphTransaction};
use async_trait::async_trait;
use chrono::Utc;

#[async_trait]
impl EdgeReader for InMemoryGraphStore {
    async fn task_exists(&self, id: &TaskId) -> Result<bool> {
        Ok(self.inner.lock().await.contains(id))
    }

    async fn task_status(&self, id: &TaskId) -> Result<Option<TaskStatus>> {
        Ok(self.inner.lock().await.status(id))
    }

    async fn has_edge(&self, task: &TaskId, dependency: &TaskId) -> Result<bool> {
        Ok(self.inner.lock().await.has_edge(task, dependency))
    }

    async fn edges_from(&self, task: &TaskId) -> Result<Vec<TaskId>> {
        Ok(self.inner.lock().await.dependencies_of(task))
    }

    async fn edges_to(&self, dependency: &TaskId) -> Result<Vec<TaskId>> {
        Ok(self.inner.lock().await.dependents_of(dependency))
    }
}

#[async_trait]
impl GraphStore for InMemoryGraphStore {
    async fn begin(&self) -> Result<Box<dyn GraphTransaction>> {
        let guard = self.inner.clone().lock_owned().await;
        Ok(Box::new(InMemoryTransaction::new(guard)))
    }

    async fn stats(&self) -> Result<DependencyStats> {
        Ok(self.inner.lock().await.stats())
    }
}

#[async_trait]
impl EdgeReader for InMemoryTransaction {
    async fn task_exists(&self, id: &TaskId) -> Result<bool> {
        Ok(self.guard.contains(id))
    }

    async fn task_status(&self, id: &TaskId) -> Result<Option<TaskStatus>> {
        Ok(self.guard.status(id))
    }

    async fn has_edge(&self, task: &TaskId, dependency: &TaskId) -> Result<bool> {
        Ok(self.guard.has_edge(task, dependency))
    }

    async fn edges_from(&self, task: &TaskId) -> Result<Vec<TaskId>> {
        Ok(self.guard.dependencies_of(task))
    }

    async fn edges_to(&self, dependency: &TaskId) -> Result<Vec<TaskId>> {
        Ok(self.guard.dependents_of(dependency))
    }
}

#[async_trait]
impl GraphTransaction for InMemoryTransaction {
    async fn insert_edge(
        &mut self,
        task: &TaskId,
        dependency: &TaskId,
    ) -> Result<DependencyEdge> {
        let edge = self.guard.add_edge(task, dependency, Utc::now())?;
        self.record_insert(task.clone(), dependency.clone());
        Ok(edge)
    }

    async fn delete_edge(&mut self, task: &TaskId, dependency: &TaskId) -> Result<bool> {
        match self.guard.remove_edge(task, dependency) {
            Some(created_at) => {
                self.record_delete(task.clone(), dependency.clone(), created_at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let mut tx = self;
        tx.finish_commit();
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        let mut tx = self;
        tx.finish_rollback();
        Ok(())
    }
}
