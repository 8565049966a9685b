use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::Args;
use veridoc::error::AppError;
use veridoc::verification::{
    DocumentAsset, DocumentId, DocumentType, MerchantDetails, OcrExtraction, RasterPage,
    RegistryRecord, VerificationRequest, VerificationService,
};

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Verify this file instead of the built-in synthetic certificate
    #[arg(long)]
    pub(crate) file: Option<PathBuf>,
    /// Document type to score the input as
    #[arg(long, default_value = "company-registration")]
    pub(crate) document_type: DemoDocumentType,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub(crate) enum DemoDocumentType {
    CompanyRegistration,
    VatCertificate,
    DirectorAppointment,
}

impl From<DemoDocumentType> for DocumentType {
    fn from(value: DemoDocumentType) -> Self {
        match value {
            DemoDocumentType::CompanyRegistration => DocumentType::CompanyRegistration,
            DemoDocumentType::VatCertificate => DocumentType::VatCertificate,
            DemoDocumentType::DirectorAppointment => DocumentType::DirectorAppointment,
        }
    }
}

/// Runs one verification locally with canned collaborator inputs and
/// prints the full outcome, so scoring changes can be eyeballed without
/// standing up the HTTP service.
pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let asset = match &args.file {
        Some(path) => {
            let bytes = std::fs::read(path)?;
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            DocumentAsset::decode(
                DocumentId(path.display().to_string()),
                mime.essence_str(),
                bytes,
            )
        }
        None => DocumentAsset::with_pages(
            DocumentId("demo-certificate".to_string()),
            "image/png",
            vec![0x89, 0x50, 0x4E, 0x47],
            vec![synthetic_certificate_page()],
        ),
    };

    let request = VerificationRequest {
        document_type: args.document_type.into(),
        asset,
        ocr: demo_ocr(),
        registry: demo_registry(),
        merchant: MerchantDetails {
            declared_name: Some("E & C Holden Limited".to_string()),
            declared_number: Some("640918".to_string()),
            declared_address: None,
        },
    };

    let outcome = VerificationService::default().verify(request);
    let rendered = serde_json::to_string_pretty(&outcome)
        .unwrap_or_else(|_| "<outcome failed to serialize>".to_string());
    println!("{rendered}");
    Ok(())
}

fn demo_ocr() -> OcrExtraction {
    let mut fields = BTreeMap::new();
    fields.insert("company_name".to_string(), "E & C HOLDEN LIMITED".to_string());
    fields.insert("company_number".to_string(), "640918".to_string());
    fields.insert("vat_number".to_string(), "123456789".to_string());
    fields.insert("address".to_string(), "12 High Street, Leeds".to_string());
    OcrExtraction {
        fields,
        raw_confidence: 96.5,
    }
}

fn demo_registry() -> RegistryRecord {
    RegistryRecord {
        canonical_name: Some("E. & C. HOLDEN LIMITED".to_string()),
        canonical_number: Some("00640918".to_string()),
        canonical_address: Some("12 High Street, Leeds".to_string()),
        found: true,
    }
}

fn synthetic_certificate_page() -> RasterPage {
    let width = 248u32;
    let height = 248u32;
    let mut pixels = Vec::with_capacity((width * height * 3) as usize);
    let mut state = 0x51AB3E7Du32;
    for y in 0..height {
        for x in 0..width {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            let ink = x % 21 < 2 && y % 8 < 3;
            let value = if ink {
                26 + (state % 9) as u8
            } else {
                248 + (state % 8) as u8
            };
            pixels.extend_from_slice(&[value, value, value]);
        }
    }
    RasterPage {
        width,
        height,
        pixels,
    }
}
