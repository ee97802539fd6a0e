/// Text-method template printing every `key=value` pair whose value is a
/// plain string, one per line, in document order.
pub const KEY_VALUE_TEMPLATE: &str = r#"<?xml version="1.0"?>
<xsl:stylesheet version="1.0" xmlns:xsl="http://www.w3.org/1999/XSL/Transform">
  <xsl:output method="text"/>
  <xsl:template match="/">
    <xsl:for-each select="//entry[value/string]">
      <xsl:value-of select="key/string"/>=<xsl:value-of select="value/string"/>
      <xsl:text>&#10;</xsl:text>
    </xsl:for-each>
  </xsl:template>
</xsl:stylesheet>
"#;

/// Template that copies the generated markup through unchanged.
pub const IDENTITY_TEMPLATE: &str = r#"<xsl:stylesheet version="1.0" xmlns:xsl="http://www.w3.org/1999/XSL/Transform">
  <xsl:output method="xml"/>
  <xsl:template match="/">
    <xsl:copy-of select="configuration"/>
  </xsl:template>
</xsl:stylesheet>
"#;

/// A template that is not even well-formed.
pub const BROKEN_TEMPLATE: &str = "<xsl:stylesheet xmlns:xsl=\"http://www.w3.org/1999/XSL/Transform\">";

pub const SIMPLE_DEFINITION: &str = "port: \"80\"\nhost: example.org\n";
