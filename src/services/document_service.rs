// src/services/document_service.rs

use std::path::PathBuf;

use chrono::NaiveDate;
use genpdf::{elements, style, Element};
use image::Luma;
use qrcode::QrCode;

use crate::{
    common::error::AppError,
    models::{
        customer::{Customer, CustomerServiceDetail},
        product::BillingCycle,
    },
};

#[derive(Clone)]
pub struct DocumentService {
    fonts_dir: PathBuf,
}

impl DocumentService {
    pub fn new(fonts_dir: impl Into<PathBuf>) -> Self {
        Self { fonts_dir: fonts_dir.into() }
    }

    /// Fatura do serviço para o período de `issued_on`.
    /// O QR code leva o número do serviço + competência, usado como referência de pagamento.
    pub fn invoice_pdf(
        &self,
        customer: &Customer,
        service: &CustomerServiceDetail,
        issued_on: NaiveDate,
    ) -> Result<Vec<u8>, AppError> {
        let font_family = genpdf::fonts::from_files(&self.fonts_dir, "Roboto", None).map_err(|_| {
            AppError::DocumentError(format!("Fonte não encontrada na pasta {}", self.fonts_dir.display()))
        })?;

        let reference = payment_reference(&service.service.service_number, issued_on);

        let mut doc = genpdf::Document::new(font_family);
        doc.set_title(format!("Fatura {}", reference));
        let mut decorator = genpdf::SimplePageDecorator::new();
        decorator.set_margins(10);
        doc.set_page_decorator(decorator);

        // --- CABEÇALHO ---
        doc.push(elements::Paragraph::new("FATURA").styled(style::Style::new().bold().with_font_size(18)));
        doc.push(elements::Paragraph::new(format!("Referência: {}", reference)));
        doc.push(elements::Paragraph::new(format!("Emissão: {}", issued_on.format("%d/%m/%Y"))));
        doc.push(elements::Break::new(1.5));

        // --- CLIENTE ---
        doc.push(elements::Paragraph::new(format!("Cliente: {} ({})", customer.name, customer.customer_code)));
        if let Some(company) = &customer.company {
            doc.push(elements::Paragraph::new(format!("Empresa: {}", company)));
        }
        if let Some(address) = service
            .service
            .installation_address
            .as_ref()
            .or(customer.address.as_ref())
        {
            doc.push(elements::Paragraph::new(format!("Endereço: {}", address)));
        }
        doc.push(elements::Break::new(2));

        // --- SERVIÇO ---
        let mut table = elements::TableLayout::new(vec![3, 4, 2, 2]);
        table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));

        let style_bold = style::Style::new().bold();
        table
            .row()
            .element(elements::Paragraph::new("Serviço").styled(style_bold))
            .element(elements::Paragraph::new("Plano").styled(style_bold))
            .element(elements::Paragraph::new("Ciclo").styled(style_bold))
            .element(elements::Paragraph::new("Valor").styled(style_bold))
            .push()
            .map_err(|e| AppError::DocumentError(e.to_string()))?;

        table
            .row()
            .element(elements::Paragraph::new(service.service.service_number.clone()))
            .element(elements::Paragraph::new(service.product_name.clone()))
            .element(elements::Paragraph::new(cycle_label(service.billing_cycle)))
            .element(elements::Paragraph::new(format!("R$ {:.2}", service.service.monthly_fee)))
            .push()
            .map_err(|e| AppError::DocumentError(e.to_string()))?;

        doc.push(table);
        doc.push(elements::Break::new(2));

        let mut total = elements::Paragraph::new(format!("TOTAL: R$ {:.2}", service.service.monthly_fee));
        total.set_alignment(genpdf::Alignment::Right);
        doc.push(total.styled(style::Style::new().bold().with_font_size(12)));
        doc.push(elements::Break::new(2));

        // --- PAGAMENTO ---
        doc.push(elements::Paragraph::new("PAGAMENTO").styled(style::Style::new().bold().with_font_size(12)));
        doc.push(elements::Paragraph::new(format!("Informe a referência {} no pagamento.", reference)));
        doc.push(elements::Break::new(1));

        let code = QrCode::new(reference.as_bytes()).map_err(|e| AppError::DocumentError(e.to_string()))?;
        let image_buffer = code.render::<Luma<u8>>().build();
        let dynamic_image = image::DynamicImage::ImageLuma8(image_buffer);

        let pdf_image = elements::Image::from_dynamic_image(dynamic_image)
            .map_err(|e| AppError::DocumentError(e.to_string()))?
            .with_scale(genpdf::Scale::new(0.5, 0.5));
        doc.push(pdf_image);

        // Renderiza para Buffer (Memória)
        let mut buffer = Vec::new();
        doc.render(&mut buffer)
            .map_err(|e| AppError::DocumentError(e.to_string()))?;

        Ok(buffer)
    }
}

pub fn payment_reference(service_number: &str, issued_on: NaiveDate) -> String {
    format!("{}-{}", service_number, issued_on.format("%Y%m"))
}

fn cycle_label(cycle: BillingCycle) -> &'static str {
    match cycle {
        BillingCycle::Monthly => "Mensal",
        BillingCycle::Quarterly => "Trimestral",
        BillingCycle::Yearly => "Anual",
        BillingCycle::OneTime => "Avulso",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_carries_service_and_period() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        assert_eq!(payment_reference("SVC-202610-0007", date), "SVC-202610-0007-202610");
    }

    #[test]
    fn missing_fonts_is_a_document_error() {
        let svc = DocumentService::new("/caminho/que/nao/existe");
        let now = chrono::Utc::now();
        let customer = Customer {
            id: uuid::Uuid::new_v4(),
            customer_code: "CUST-20261016-001".into(),
            lead_id: None,
            name: "Padaria Central".into(),
            company: None,
            email: None,
            phone: None,
            address: None,
            portal_password_hash: None,
            created_at: now,
            updated_at: now,
        };
        let service = CustomerServiceDetail {
            service: crate::models::customer::CustomerService {
                id: uuid::Uuid::new_v4(),
                service_number: "SVC-202610-0001".into(),
                customer_id: customer.id,
                product_id: uuid::Uuid::new_v4(),
                status: crate::models::customer::ServiceStatus::Active,
                monthly_fee: rust_decimal::Decimal::new(9990, 2),
                start_date: now.date_naive(),
                end_date: None,
                installation_address: None,
                notes: None,
                created_at: now,
                updated_at: now,
            },
            product_name: "Fibra 300".into(),
            product_code: "FIBRA-300".into(),
            billing_cycle: BillingCycle::Monthly,
            bandwidth_mbps: Some(300),
        };

        let result = svc.invoice_pdf(&customer, &service, now.date_naive());
        assert!(matches!(result, Err(AppError::DocumentError(_))));
    }
}
