//! Plan catalog: read-mostly reference data with two invariants. Plan
//! names are unique, and a plan with active subscriptions cannot be
//! deleted, only deactivated.

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use worklane_database::models::{Plan, PlanChanges};
use worklane_database::repositories::plan;
use worklane_models::billing::{CreatePlanRequest, UpdatePlanRequest};

use crate::errors::ServiceError;

pub struct PlanService {
    pool: PgPool,
}

impl PlanService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_plan(&self, req: &CreatePlanRequest) -> Result<Plan, ServiceError> {
        let mut tx = self.pool.begin().await?;
        // Unique violation on the name maps to Conflict at the error
        // boundary.
        let created = plan::insert(
            &mut tx,
            &req.name,
            req.price,
            req.duration_months,
            req.max_employees,
            req.max_jobs,
            req.features.as_ref(),
            req.is_active.unwrap_or(true),
        )
        .await?;
        tx.commit().await?;
        info!(plan_id = %created.id, name = %created.name, "plan created");
        Ok(created)
    }

    pub async fn update_plan(
        &self,
        plan_id: Uuid,
        req: &UpdatePlanRequest,
    ) -> Result<Plan, ServiceError> {
        let changes = PlanChanges {
            name: req.name.clone(),
            price: req.price,
            duration_months: req.duration_months,
            max_employees: req.max_employees,
            max_jobs: req.max_jobs,
            features: req.features.clone(),
            is_active: req.is_active,
        };
        if changes.is_empty() {
            return Err(ServiceError::Validation(
                "no fields to update".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;
        let updated = plan::update(&mut tx, plan_id, &changes)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("plan {} not found", plan_id)))?;
        tx.commit().await?;
        Ok(updated)
    }

    pub async fn delete_plan(&self, plan_id: Uuid) -> Result<(), ServiceError> {
        let mut tx = self.pool.begin().await?;

        let live = plan::active_subscription_count(&mut tx, plan_id).await?;
        if live > 0 {
            return Err(ServiceError::State(format!(
                "plan {} has {} active subscriptions; deactivate it instead",
                plan_id, live
            )));
        }
        if !plan::delete(&mut tx, plan_id).await? {
            return Err(ServiceError::NotFound(format!(
                "plan {} not found",
                plan_id
            )));
        }

        tx.commit().await?;
        info!(plan_id = %plan_id, "plan deleted");
        Ok(())
    }

    pub async fn get_plan(&self, plan_id: Uuid) -> Result<Plan, ServiceError> {
        let mut conn = self.pool.acquire().await?;
        plan::find_by_id(&mut conn, plan_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("plan {} not found", plan_id)))
    }

    pub async fn list_plans(&self, only_active: bool) -> Result<Vec<Plan>, ServiceError> {
        Ok(plan::list(&self.pool, only_active).await?)
    }
}
