// db/projectdb.rs
use async_trait::async_trait;
use sqlx::{Error, Postgres, Transaction};
use uuid::Uuid;

use super::db::DBClient;
use crate::models::{ordermodels::*, projectmodels::*};

#[async_trait]
pub trait ProjectExt {
    async fn create_project(&self, project: NewProject) -> Result<Project, Error>;

    async fn get_project_by_id(&self, project_id: Uuid) -> Result<Option<Project>, Error>;

    async fn update_project_status(
        &self,
        project_id: Uuid,
        status: ProjectStatus,
    ) -> Result<Project, Error>;

    async fn create_proposal(&self, proposal: NewProposal) -> Result<Proposal, Error>;

    async fn get_proposal_by_id(&self, proposal_id: Uuid) -> Result<Option<Proposal>, Error>;

    async fn get_project_proposals(&self, project_id: Uuid) -> Result<Vec<Proposal>, Error>;

    async fn update_proposal_status(
        &self,
        proposal_id: Uuid,
        status: ProposalStatus,
    ) -> Result<Proposal, Error>;

    async fn create_milestone(&self, milestone: NewMilestone) -> Result<Milestone, Error>;

    async fn get_milestone_by_id(&self, milestone_id: Uuid) -> Result<Option<Milestone>, Error>;

    async fn get_project_milestones(&self, project_id: Uuid) -> Result<Vec<Milestone>, Error>;

    async fn update_milestone_status(
        &self,
        milestone_id: Uuid,
        status: MilestoneStatus,
    ) -> Result<Milestone, Error>;

    /// Insert the delivery and move its milestone to `submitted` together.
    async fn create_delivery(&self, delivery: NewDelivery) -> Result<(Delivery, Milestone), Error>;

    async fn get_milestone_deliveries(&self, milestone_id: Uuid) -> Result<Vec<Delivery>, Error>;

    /// Claim a paid order and write its project, proposal and milestones in one
    /// transaction. Returns `None` without writing anything when the order is no
    /// longer `paid`.
    async fn provision_order(&self, plan: ProvisionPlan) -> Result<Option<BridgeOutcome>, Error>;

    /// Move an order from `from` to `refunded`, detach its project and cancel
    /// that project in one transaction. `None` when the order is no longer in
    /// `from`.
    async fn record_refund(&self, order_id: Uuid, from: OrderStatus) -> Result<Option<Order>, Error>;
}

async fn insert_project(
    tx: &mut Transaction<'_, Postgres>,
    project: &NewProject,
) -> Result<Project, Error> {
    sqlx::query_as::<_, Project>(
        r#"
        INSERT INTO projects (client_id, title, description, budget_min, budget_max, deadline, status, category)
        VALUES ($1, $2, $3, $4, $5, $6, 'open', $7)
        RETURNING *
        "#,
    )
    .bind(project.client_id)
    .bind(&project.title)
    .bind(&project.description)
    .bind(project.budget_min)
    .bind(project.budget_max)
    .bind(project.deadline)
    .bind(project.category)
    .fetch_one(&mut **tx)
    .await
}

async fn insert_proposal(
    tx: &mut Transaction<'_, Postgres>,
    proposal: &NewProposal,
    project_id: Uuid,
) -> Result<Proposal, Error> {
    sqlx::query_as::<_, Proposal>(
        r#"
        INSERT INTO proposals (project_id, creator_id, cover_letter, delivery_days, price, milestones, revision_scope, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(project_id)
    .bind(proposal.creator_id)
    .bind(&proposal.cover_letter)
    .bind(proposal.delivery_days)
    .bind(proposal.price)
    .bind(&proposal.milestones)
    .bind(&proposal.revision_scope)
    .bind(proposal.status)
    .fetch_one(&mut **tx)
    .await
}

async fn insert_milestone(
    tx: &mut Transaction<'_, Postgres>,
    milestone: &NewMilestone,
    project_id: Uuid,
) -> Result<Milestone, Error> {
    sqlx::query_as::<_, Milestone>(
        r#"
        INSERT INTO milestones (project_id, title, description, amount, due_date, status)
        VALUES ($1, $2, $3, $4, $5, 'pending')
        RETURNING *
        "#,
    )
    .bind(project_id)
    .bind(&milestone.title)
    .bind(&milestone.description)
    .bind(milestone.amount)
    .bind(milestone.due_date)
    .fetch_one(&mut **tx)
    .await
}

#[async_trait]
impl ProjectExt for DBClient {
    async fn create_project(&self, project: NewProject) -> Result<Project, Error> {
        let mut tx = self.pool.begin().await?;
        let project = insert_project(&mut tx, &project).await?;
        tx.commit().await?;
        Ok(project)
    }

    async fn get_project_by_id(&self, project_id: Uuid) -> Result<Option<Project>, Error> {
        sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = $1")
            .bind(project_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn update_project_status(
        &self,
        project_id: Uuid,
        status: ProjectStatus,
    ) -> Result<Project, Error> {
        sqlx::query_as::<_, Project>(
            "UPDATE projects SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(project_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await
    }

    async fn create_proposal(&self, proposal: NewProposal) -> Result<Proposal, Error> {
        let mut tx = self.pool.begin().await?;
        let created = insert_proposal(&mut tx, &proposal, proposal.project_id).await?;
        tx.commit().await?;
        Ok(created)
    }

    async fn get_proposal_by_id(&self, proposal_id: Uuid) -> Result<Option<Proposal>, Error> {
        sqlx::query_as::<_, Proposal>("SELECT * FROM proposals WHERE id = $1")
            .bind(proposal_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_project_proposals(&self, project_id: Uuid) -> Result<Vec<Proposal>, Error> {
        sqlx::query_as::<_, Proposal>(
            "SELECT * FROM proposals WHERE project_id = $1 ORDER BY created_at ASC",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn update_proposal_status(
        &self,
        proposal_id: Uuid,
        status: ProposalStatus,
    ) -> Result<Proposal, Error> {
        sqlx::query_as::<_, Proposal>(
            "UPDATE proposals SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(proposal_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await
    }

    async fn create_milestone(&self, milestone: NewMilestone) -> Result<Milestone, Error> {
        let mut tx = self.pool.begin().await?;
        let created = insert_milestone(&mut tx, &milestone, milestone.project_id).await?;
        tx.commit().await?;
        Ok(created)
    }

    async fn get_milestone_by_id(&self, milestone_id: Uuid) -> Result<Option<Milestone>, Error> {
        sqlx::query_as::<_, Milestone>("SELECT * FROM milestones WHERE id = $1")
            .bind(milestone_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_project_milestones(&self, project_id: Uuid) -> Result<Vec<Milestone>, Error> {
        sqlx::query_as::<_, Milestone>(
            "SELECT * FROM milestones WHERE project_id = $1 ORDER BY due_date ASC",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn update_milestone_status(
        &self,
        milestone_id: Uuid,
        status: MilestoneStatus,
    ) -> Result<Milestone, Error> {
        sqlx::query_as::<_, Milestone>(
            "UPDATE milestones SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(milestone_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await
    }

    async fn create_delivery(&self, delivery: NewDelivery) -> Result<(Delivery, Milestone), Error> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, Delivery>(
            r#"
            INSERT INTO deliveries (milestone_id, file_url, has_watermark, note)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(delivery.milestone_id)
        .bind(delivery.file_url)
        .bind(delivery.has_watermark)
        .bind(delivery.note)
        .fetch_one(&mut *tx)
        .await?;

        let milestone = sqlx::query_as::<_, Milestone>(
            "UPDATE milestones SET status = 'submitted', updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(created.milestone_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((created, milestone))
    }

    async fn get_milestone_deliveries(&self, milestone_id: Uuid) -> Result<Vec<Delivery>, Error> {
        sqlx::query_as::<_, Delivery>(
            "SELECT * FROM deliveries WHERE milestone_id = $1 ORDER BY submitted_at ASC",
        )
        .bind(milestone_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn provision_order(&self, plan: ProvisionPlan) -> Result<Option<BridgeOutcome>, Error> {
        let mut tx = self.pool.begin().await?;

        // Claim first: the row lock makes a concurrent bridge for the same
        // order wait here and then see zero rows.
        let claimed = sqlx::query(
            r#"
            UPDATE service_orders
            SET status = 'project_created', updated_at = NOW()
            WHERE id = $1 AND status = 'paid'
            "#,
        )
        .bind(plan.order_id)
        .execute(&mut *tx)
        .await?;

        if claimed.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        let project = insert_project(&mut tx, &plan.project).await?;

        let project = sqlx::query_as::<_, Project>(
            "UPDATE projects SET status = 'in_progress', updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(project.id)
        .fetch_one(&mut *tx)
        .await?;

        let proposal = insert_proposal(&mut tx, &plan.proposal, project.id).await?;

        let mut milestones = Vec::with_capacity(plan.milestones.len());
        for milestone in &plan.milestones {
            milestones.push(insert_milestone(&mut tx, milestone, project.id).await?);
        }

        let order = sqlx::query_as::<_, Order>(
            "UPDATE service_orders SET project_id = $2 WHERE id = $1 RETURNING *",
        )
        .bind(plan.order_id)
        .bind(project.id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(BridgeOutcome {
            order,
            project,
            proposal,
            milestones,
        }))
    }

    async fn record_refund(&self, order_id: Uuid, from: OrderStatus) -> Result<Option<Order>, Error> {
        let mut tx = self.pool.begin().await?;

        let project_id = sqlx::query_scalar::<_, Option<Uuid>>(
            "SELECT project_id FROM service_orders WHERE id = $1 AND status = $2 FOR UPDATE",
        )
        .bind(order_id)
        .bind(from)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(project_id) = project_id else {
            tx.rollback().await?;
            return Ok(None);
        };

        let order = sqlx::query_as::<_, Order>(
            r#"
            UPDATE service_orders
            SET status = 'refunded', project_id = NULL, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(order_id)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(project_id) = project_id {
            sqlx::query(
                "UPDATE projects SET status = 'cancelled', updated_at = NOW() WHERE id = $1",
            )
            .bind(project_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(Some(order))
    }
}
