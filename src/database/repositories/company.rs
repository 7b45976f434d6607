use anyhow::Result;
use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::database::{
    models::{
        AddEmployeeToCompanyInput, Company, CompanyEmployeeInfo, CompanyInfo, CompanyRole,
        CreateCompanyInput,
    },
    utils::sql,
};

#[derive(Clone)]
pub struct CompanyRepository {
    pool: PgPool,
}

impl CompanyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert_company(
        tx: &mut Transaction<'_, Postgres>,
        request: &CreateCompanyInput,
    ) -> Result<Company, sqlx::Error> {
        sqlx::query_as::<_, Company>(&sql(r#"
            INSERT INTO
                companies (
                    name,
                    email,
                    phone,
                    timezone
                )
            VALUES
                (?, ?, ?, ?)
            RETURNING
                id,
                name,
                email,
                phone,
                timezone,
                created_at,
                updated_at
        "#))
        .bind(request.name.trim())
        .bind(&request.email)
        .bind(&request.phone)
        .bind(request.timezone.as_deref().unwrap_or("UTC"))
        .fetch_one(&mut **tx)
        .await
    }

    /// Adds a membership. Marking it primary clears the user's other
    /// primary flags first.
    pub async fn insert_member(
        tx: &mut Transaction<'_, Postgres>,
        company_id: Uuid,
        user_id: Uuid,
        role: CompanyRole,
        is_primary: bool,
        hire_date: Option<NaiveDate>,
    ) -> Result<(), sqlx::Error> {
        if is_primary {
            sqlx::query(&sql(
                "UPDATE company_employees SET is_primary = FALSE WHERE user_id = ?",
            ))
            .bind(user_id)
            .execute(&mut **tx)
            .await?;
        }

        sqlx::query(&sql(r#"
            INSERT INTO
                company_employees (
                    user_id,
                    company_id,
                    role,
                    is_primary,
                    hire_date
                )
            VALUES
                (?, ?, ?, ?, ?)
        "#))
        .bind(user_id)
        .bind(company_id)
        .bind(role)
        .bind(is_primary)
        .bind(hire_date)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    pub async fn add_employee(
        &self,
        company_id: Uuid,
        request: &AddEmployeeToCompanyInput,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        Self::insert_member(
            &mut tx,
            company_id,
            request.user_id,
            request.role.unwrap_or_default(),
            request.is_primary.unwrap_or(false),
            request.hire_date,
        )
        .await?;
        tx.commit().await?;

        Ok(())
    }

    pub async fn find_by_id(&self, company_id: Uuid) -> Result<Option<Company>> {
        let company = sqlx::query_as::<_, Company>(&sql(r#"
            SELECT
                id,
                name,
                email,
                phone,
                timezone,
                created_at,
                updated_at
            FROM
                companies
            WHERE
                id = ?
        "#))
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(company)
    }

    pub async fn find_company_info(
        &self,
        user_id: Uuid,
        company_id: Uuid,
    ) -> Result<Option<CompanyInfo>> {
        let company_info = sqlx::query_as::<_, CompanyInfo>(&sql(r#"
            SELECT
                c.id,
                c.name,
                c.email,
                c.phone,
                c.timezone,
                ce.role,
                ce.is_primary,
                ce.hire_date
            FROM
                companies c
                JOIN company_employees ce ON c.id = ce.company_id
            WHERE
                ce.user_id = ?
                AND c.id = ?
        "#))
        .bind(user_id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(company_info)
    }

    pub async fn get_companies_for_user(&self, user_id: Uuid) -> Result<Vec<CompanyInfo>> {
        let company_infos = sqlx::query_as::<_, CompanyInfo>(&sql(r#"
            SELECT
                c.id,
                c.name,
                c.email,
                c.phone,
                c.timezone,
                ce.role,
                ce.is_primary,
                ce.hire_date
            FROM
                companies c
                JOIN company_employees ce ON c.id = ce.company_id
            WHERE
                ce.user_id = ?
            ORDER BY
                ce.is_primary DESC,
                c.name ASC
        "#))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(company_infos)
    }

    pub async fn get_company_employees(
        &self,
        company_id: Uuid,
    ) -> Result<Vec<CompanyEmployeeInfo>> {
        let employees = sqlx::query_as::<_, CompanyEmployeeInfo>(&sql(r#"
            SELECT
                u.id,
                u.email,
                u.name,
                ce.role,
                ce.is_primary,
                ce.hire_date
            FROM
                users u
                JOIN company_employees ce ON u.id = ce.user_id
            WHERE
                ce.company_id = ?
            ORDER BY
                u.name ASC
        "#))
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(employees)
    }

    pub async fn remove_employee(&self, company_id: Uuid, user_id: Uuid) -> Result<Option<()>> {
        let result = sqlx::query(&sql(
            "DELETE FROM company_employees WHERE company_id = ? AND user_id = ?",
        ))
        .bind(company_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        Ok(Some(()))
    }

    pub async fn update_employee_role(
        &self,
        company_id: Uuid,
        user_id: Uuid,
        role: CompanyRole,
    ) -> Result<Option<()>> {
        let result = sqlx::query(&sql(r#"
            UPDATE company_employees
            SET
                role = ?,
                updated_at = NOW()
            WHERE
                company_id = ?
                AND user_id = ?
        "#))
        .bind(role)
        .bind(company_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        Ok(Some(()))
    }

    pub async fn member_role(&self, user_id: Uuid, company_id: Uuid) -> Result<Option<CompanyRole>> {
        let role = sqlx::query_scalar::<_, CompanyRole>(&sql(
            "SELECT role FROM company_employees WHERE user_id = ? AND company_id = ?",
        ))
        .bind(user_id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(role)
    }
}
