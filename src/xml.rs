//! Built-in XML for the package-level parts
//!
//! Covers the parts the assembler renders itself: core/app document
//! properties, the workbook part, the built-in theme, and the minimal style
//! sheet. Worksheet/drawing/table/comment XML comes from the renderer traits
//! in [`crate::transform`].

use crate::prepare::PreparedWorkbook;

/// Escape XML special characters
pub fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// `docProps/core.xml`
pub(crate) fn core_xml(model: &PreparedWorkbook) -> String {
    format!(
        "{}\n<cp:coreProperties \
         xmlns:cp=\"http://schemas.openxmlformats.org/package/2006/metadata/core-properties\" \
         xmlns:dc=\"http://purl.org/dc/elements/1.1/\" \
         xmlns:dcterms=\"http://purl.org/dc/terms/\" \
         xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\">\
         <dc:creator>{}</dc:creator>\
         <cp:lastModifiedBy>{}</cp:lastModifiedBy>\
         <dcterms:created xsi:type=\"dcterms:W3CDTF\">{}</dcterms:created>\
         <dcterms:modified xsi:type=\"dcterms:W3CDTF\">{}</dcterms:modified>\
         </cp:coreProperties>",
        XML_DECL,
        escape(&model.creator),
        escape(&model.last_modified_by),
        model.created.format("%Y-%m-%dT%H:%M:%SZ"),
        model.modified.format("%Y-%m-%dT%H:%M:%SZ"),
    )
}

/// `docProps/app.xml`
pub(crate) fn app_xml(model: &PreparedWorkbook) -> String {
    let count = model.worksheets.len();
    let titles: String = model
        .worksheets
        .iter()
        .map(|ws| format!("<vt:lpstr>{}</vt:lpstr>", escape(&ws.name)))
        .collect();
    format!(
        "{XML_DECL}\n<Properties \
         xmlns=\"http://schemas.openxmlformats.org/officeDocument/2006/extended-properties\" \
         xmlns:vt=\"http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes\">\
         <Application>Microsoft Excel</Application>\
         <DocSecurity>0</DocSecurity>\
         <ScaleCrop>false</ScaleCrop>\
         <HeadingPairs><vt:vector size=\"2\" baseType=\"variant\">\
         <vt:variant><vt:lpstr>Worksheets</vt:lpstr></vt:variant>\
         <vt:variant><vt:i4>{count}</vt:i4></vt:variant>\
         </vt:vector></HeadingPairs>\
         <TitlesOfParts><vt:vector size=\"{count}\" baseType=\"lpstr\">{titles}</vt:vector></TitlesOfParts>\
         <LinksUpToDate>false</LinksUpToDate>\
         <SharedDoc>false</SharedDoc>\
         <AppVersion>16.0300</AppVersion>\
         </Properties>"
    )
}

/// `xl/workbook.xml` — rendered last, enumerates the final sheet list with
/// the relationship ids allocated at preparation
pub(crate) fn workbook_xml(model: &PreparedWorkbook) -> String {
    let mut xml = String::with_capacity(512 + model.worksheets.len() * 96);
    xml.push_str(XML_DECL);
    xml.push('\n');
    xml.push_str(
        "<workbook xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\" \
         xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\">",
    );
    xml.push_str("<fileVersion appName=\"xl\" lastEdited=\"7\" lowestEdited=\"7\" rupBuild=\"22621\"/>");
    if model.date1904 {
        xml.push_str("<workbookPr date1904=\"1\" defaultThemeVersion=\"166925\"/>");
    } else {
        xml.push_str("<workbookPr defaultThemeVersion=\"166925\"/>");
    }
    xml.push_str(
        "<bookViews><workbookView xWindow=\"0\" yWindow=\"0\" windowWidth=\"28800\" windowHeight=\"12600\"/></bookViews>",
    );
    xml.push_str("<sheets>");
    for ws in &model.worksheets {
        xml.push_str(&format!(
            r#"<sheet name="{}" sheetId="{}" r:id="{}"/>"#,
            escape(&ws.name),
            ws.id,
            ws.rel_id
        ));
    }
    xml.push_str("</sheets><calcPr calcId=\"191029\"/></workbook>");
    xml
}

/// Built-in theme written as `xl/theme/theme1.xml` when the model supplies
/// no themes of its own
pub const THEME1: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Office Theme">
  <a:themeElements>
    <a:clrScheme name="Office">
      <a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1>
      <a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1>
      <a:dk2><a:srgbClr val="44546A"/></a:dk2>
      <a:lt2><a:srgbClr val="E7E6E6"/></a:lt2>
      <a:accent1><a:srgbClr val="4472C4"/></a:accent1>
      <a:accent2><a:srgbClr val="ED7D31"/></a:accent2>
      <a:accent3><a:srgbClr val="A5A5A5"/></a:accent3>
      <a:accent4><a:srgbClr val="FFC000"/></a:accent4>
      <a:accent5><a:srgbClr val="5B9BD5"/></a:accent5>
      <a:accent6><a:srgbClr val="70AD47"/></a:accent6>
      <a:hlink><a:srgbClr val="0563C1"/></a:hlink>
      <a:folHlink><a:srgbClr val="954F72"/></a:folHlink>
    </a:clrScheme>
    <a:fontScheme name="Office">
      <a:majorFont><a:latin typeface="Calibri Light"/></a:majorFont>
      <a:minorFont><a:latin typeface="Calibri"/></a:minorFont>
    </a:fontScheme>
    <a:fmtScheme name="Office"/>
  </a:themeElements>
</a:theme>"#;

/// Minimal valid style sheet produced by the default style manager
pub(crate) const MINIMAL_STYLESHEET: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    "\n",
    r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
    r#"<fonts count="1"><font><sz val="11"/><color theme="1"/><name val="Calibri"/><family val="2"/></font></fonts>"#,
    r#"<fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills>"#,
    r#"<borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders>"#,
    r#"<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#,
    r#"<cellXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/></cellXfs>"#,
    r#"<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>"#,
    r#"</styleSheet>"#,
);
